//! Deterministic textual dump of a completed circuit.
//!
//! The format is FIRRTL-flavoured and exists so declaration order can be
//! inspected and asserted on; it is not a stable interchange format.

use crate::circuit::CompletedCircuit;
use crate::expr::{Expr, UnaryOp};
use crate::module::CompletedModule;
use crate::signal::{SignalKind, SignalRef};
use std::fmt::Write;

/// Renders every module of the circuit, in completion order.
pub fn print_circuit(circuit: &CompletedCircuit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "circuit {} :", circuit.resolve(circuit.name));
    for module in circuit.modules() {
        print_module_into(circuit, module, &mut out);
    }
    out
}

/// Renders a single module of `circuit`.
pub fn print_module(circuit: &CompletedCircuit, module: &CompletedModule) -> String {
    let mut out = String::new();
    print_module_into(circuit, module, &mut out);
    out
}

fn print_module_into(circuit: &CompletedCircuit, module: &CompletedModule, out: &mut String) {
    let _ = writeln!(out, "  module {} :", circuit.resolve(module.name));
    for port in &module.ports {
        let _ = writeln!(
            out,
            "    {} {} : {}",
            port.direction.keyword(),
            circuit.resolve(port.name),
            port.ty
        );
    }
    if !module.ports.is_empty() {
        out.push('\n');
    }
    for signal in module.signals.values() {
        let name = circuit.resolve(signal.name);
        match &signal.kind {
            SignalKind::Wire => {
                let _ = writeln!(out, "    wire {name} : {}", signal.ty);
            }
            SignalKind::Reg { clock, reset: None } => {
                let _ = writeln!(
                    out,
                    "    reg {name} : {}, {}",
                    signal.ty,
                    ref_name(circuit, module, *clock)
                );
            }
            SignalKind::Reg {
                clock,
                reset: Some(reset),
            } => {
                let _ = writeln!(
                    out,
                    "    regreset {name} : {}, {}, {}, {}",
                    signal.ty,
                    ref_name(circuit, module, *clock),
                    ref_name(circuit, module, reset.signal),
                    expr_text(circuit, module, &reset.init)
                );
            }
        }
    }
    for inst in module.instances.values() {
        let child = circuit
            .module(inst.module)
            .map_or("<missing>", |m| circuit.resolve(m.name));
        let _ = writeln!(out, "    inst {} of {child}", circuit.resolve(inst.name));
    }
    for conn in &module.connections {
        let _ = writeln!(
            out,
            "    {} <= {}",
            ref_name(circuit, module, conn.dest),
            expr_text(circuit, module, &conn.source)
        );
    }
}

/// Name of a module-local reference as it appears in the dump.
pub fn ref_name(circuit: &CompletedCircuit, module: &CompletedModule, target: SignalRef) -> String {
    match target {
        SignalRef::Port(id) => module
            .ports
            .get(id.index())
            .map_or_else(|| format!("<port {}>", id.as_raw()), |p| circuit.resolve(p.name).to_string()),
        SignalRef::Signal(id) => module.signals.get(id).map_or_else(
            || format!("<signal {}>", id.as_raw()),
            |s| circuit.resolve(s.name).to_string(),
        ),
        SignalRef::InstancePort { instance, port } => {
            let Some(inst) = module.instances.get(instance) else {
                return format!("<instance {}>", instance.as_raw());
            };
            let port_name = circuit
                .module(inst.module)
                .and_then(|m| m.ports.get(port.index()))
                .map_or("<port>", |p| circuit.resolve(p.name));
            format!("{}.{port_name}", circuit.resolve(inst.name))
        }
    }
}

fn expr_text(circuit: &CompletedCircuit, module: &CompletedModule, expr: &Expr) -> String {
    match expr {
        Expr::Literal { value, width } => format!("UInt<{width}>({value})"),
        Expr::Ref { target, .. } => ref_name(circuit, module, *target),
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
            ..
        } => format!("not({})", expr_text(circuit, module, operand)),
        Expr::Binary { op, lhs, rhs, .. } => format!(
            "{}({}, {})",
            op.mnemonic(),
            expr_text(circuit, module, lhs),
            expr_text(circuit, module, rhs)
        ),
        Expr::Mux {
            cond,
            then,
            otherwise,
            ..
        } => format!(
            "mux({}, {}, {})",
            expr_text(circuit, module, cond),
            expr_text(circuit, module, then),
            expr_text(circuit, module, otherwise)
        ),
    }
}
