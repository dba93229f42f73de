//! Definition cache and instance semantics.

use std::cell::Cell;
use std::rc::Rc;

use kiln_conformance::{assert_lines_in_order, build, build_err};
use kiln_elaborate::{Definition, DefinitionKey, ElabContext, ElabError, ElabResult, ModuleSpec};
use kiln_ir::{InstanceGraph, PortDirection, Type};

fn define_leaf(ctx: &mut ElabContext, runs: &Rc<Cell<u32>>) -> ElabResult<Definition> {
    let runs = Rc::clone(runs);
    ctx.define(DefinitionKey::new("Leaf"), ModuleSpec::bare("Leaf"), move |ctx| {
        runs.set(runs.get() + 1);
        let a = ctx.input("a", Type::uint(4))?;
        let y = ctx.output("y", Type::uint(4))?;
        ctx.connect(&y, !&a)
    })
}

#[test]
fn one_definition_two_instances_runs_body_once() {
    let runs = Rc::new(Cell::new(0));
    let r = Rc::clone(&runs);
    let out = build(ModuleSpec::bare("Top"), move |ctx| {
        let leaf = define_leaf(ctx, &r)?;
        let again = define_leaf(ctx, &r)?;
        assert!(leaf.same_as(&again));
        let u0 = ctx.instantiate(&leaf, "u0")?;
        let u1 = ctx.instantiate(&again, "u1")?;
        assert_ne!(u0.id(), u1.id());
        assert!(u0.definition().same_as(u1.definition()));
        assert_eq!(ctx.cache().hits(), 1);
        assert_eq!(ctx.cache().misses(), 1);
        Ok(())
    });

    assert_eq!(runs.get(), 1);
    assert_eq!(out.circuit.module_count(), 2);
    let top = out.module("Top");
    let leaf = out.module("Leaf");
    let children: Vec<_> = top.instances.values().collect();
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|c| c.module == leaf.id));
    assert_ne!(children[0].name, children[1].name);
    assert_lines_in_order(&out.printed("Top"), &["inst u0 of Leaf", "inst u1 of Leaf"]);
}

#[test]
fn cached_definition_shared_across_parents() {
    let runs = Rc::new(Cell::new(0));
    let r = Rc::clone(&runs);
    let out = build(ModuleSpec::bare("Top"), move |ctx| {
        let left = Rc::clone(&r);
        let right = Rc::clone(&r);
        ctx.module(ModuleSpec::bare("Left"), "l", move |ctx| {
            let leaf = define_leaf(ctx, &left)?;
            ctx.instantiate(&leaf, "leaf")?;
            Ok(())
        })?;
        ctx.module(ModuleSpec::bare("Right"), "r", move |ctx| {
            let leaf = define_leaf(ctx, &right)?;
            ctx.instantiate(&leaf, "leaf")?;
            Ok(())
        })?;
        Ok(())
    });

    assert_eq!(runs.get(), 1);
    let leaf = out.module("Leaf");
    let graph = InstanceGraph::build(&out.circuit).unwrap();
    assert_eq!(graph.instance_count(leaf.id), 2);
    assert_eq!(
        out.module("Left").instances.values().next().unwrap().module,
        out.module("Right").instances.values().next().unwrap().module
    );
}

#[test]
fn cache_hit_does_not_rerun_hooks() {
    let hooks = Rc::new(Cell::new(0));
    let h = Rc::clone(&hooks);
    build(ModuleSpec::bare("Top"), move |ctx| {
        for name in ["a", "b", "c"] {
            let h = Rc::clone(&h);
            let def = ctx.define(DefinitionKey::new("Hooked"), ModuleSpec::bare("Hooked"), move |ctx| {
                ctx.on_body_end(move |_| {
                    h.set(h.get() + 1);
                    Ok(())
                })
            })?;
            ctx.instantiate(&def, name)?;
        }
        Ok(())
    });
    assert_eq!(hooks.get(), 1);
}

#[test]
fn parameters_distinguish_definitions() {
    let out = build(ModuleSpec::bare("Top"), |ctx| {
        for (inst, width) in [("narrow", 4u32), ("wide", 16), ("narrow2", 4)] {
            let def = ctx.define(
                DefinitionKey::new("Reg").param("width", width),
                ModuleSpec::bare("Reg"),
                |ctx| {
                    ctx.input("d", Type::uint(width))?;
                    ctx.output("q", Type::uint(width))?;
                    Ok(())
                },
            )?;
            ctx.instantiate(&def, inst)?;
        }
        Ok(())
    });

    assert_eq!(out.circuit.module_count(), 3);
    assert_eq!(out.module("Reg").ports[0].ty, Type::uint(4));
    assert_eq!(out.module("Reg_1").ports[0].ty, Type::uint(16));
    assert_lines_in_order(
        &out.printed("Top"),
        &["inst narrow of Reg", "inst wide of Reg_1", "inst narrow2 of Reg"],
    );
}

#[test]
fn parameter_order_does_not_change_the_key() {
    let runs = Rc::new(Cell::new(0));
    let r = Rc::clone(&runs);
    build(ModuleSpec::bare("Top"), move |ctx| {
        let keys = [
            DefinitionKey::new("Fifo").param("depth", 8u32).param("width", 32u32),
            DefinitionKey::new("Fifo").param("width", 32u32).param("depth", 8u32),
        ];
        for (i, key) in keys.into_iter().enumerate() {
            let r = Rc::clone(&r);
            let def = ctx.define(key, ModuleSpec::bare("Fifo"), move |_| {
                r.set(r.get() + 1);
                Ok(())
            })?;
            ctx.instantiate(&def, &format!("fifo{i}"))?;
        }
        Ok(())
    });
    assert_eq!(runs.get(), 1);
}

#[test]
fn recursive_definition_is_a_nesting_error() {
    fn recurse(ctx: &mut ElabContext) -> ElabResult<()> {
        let def = ctx.define(DefinitionKey::new("Fractal"), ModuleSpec::bare("Fractal"), recurse)?;
        ctx.instantiate(&def, "inner")?;
        Ok(())
    }
    let failure = build_err(ModuleSpec::bare("Top"), recurse);
    assert_eq!(
        failure.error,
        ElabError::nesting("`Fractal` is defined in terms of itself")
    );
    assert_eq!(failure.path, vec!["Top".to_string(), "Fractal".to_string()]);
}

#[test]
fn module_convenience_never_shares() {
    let out = build(ModuleSpec::bare("Top"), |ctx| {
        for name in ["u0", "u1"] {
            ctx.module(ModuleSpec::bare("Leaf"), name, |ctx| {
                ctx.output("y", Type::BOOL)?;
                Ok(())
            })?;
        }
        Ok(())
    });
    assert_eq!(out.circuit.module_count(), 3);
    assert_lines_in_order(&out.printed("Top"), &["inst u0 of Leaf", "inst u1 of Leaf_1"]);
}

#[test]
fn introspection_reads_cached_ports() {
    let runs = Rc::new(Cell::new(0));
    let r = Rc::clone(&runs);
    build(ModuleSpec::bare("Top"), move |ctx| {
        let leaf = define_leaf(ctx, &r)?;
        let names: Vec<_> = leaf.ports().iter().map(|p| ctx.resolve(p.name).to_string()).collect();
        assert_eq!(names, vec!["a", "y"]);
        assert_eq!(leaf.ports()[1].direction, PortDirection::Output);

        let top = ctx.current_module()?;
        ctx.input("x", Type::BOOL)?;
        assert_eq!(ctx.port_names(top)?, vec!["x".to_string()]);
        Ok(())
    });
    assert_eq!(runs.get(), 1);
}

#[test]
fn unknown_instance_port() {
    let runs = Rc::new(Cell::new(0));
    let failure = build_err(ModuleSpec::bare("Top"), move |ctx| {
        let leaf = define_leaf(ctx, &runs)?;
        let u0 = ctx.instantiate(&leaf, "u0")?;
        ctx.instance_port(&u0, "missing")?;
        Ok(())
    });
    assert_eq!(
        failure.error,
        ElabError::UnknownPort {
            module: "Leaf".to_string(),
            port: "missing".to_string()
        }
    );
}

#[test]
fn duplicate_instance_name() {
    let runs = Rc::new(Cell::new(0));
    let failure = build_err(ModuleSpec::bare("Top"), move |ctx| {
        let leaf = define_leaf(ctx, &runs)?;
        ctx.instantiate(&leaf, "u0")?;
        ctx.instantiate(&leaf, "u0")?;
        Ok(())
    });
    assert_eq!(
        failure.error,
        ElabError::DuplicateName {
            module: "Top".to_string(),
            name: "u0".to_string()
        }
    );
}

#[test]
fn children_complete_before_parents() {
    let out = build(ModuleSpec::bare("Top"), |ctx| {
        ctx.module(ModuleSpec::bare("Mid"), "m", |ctx| {
            ctx.module(ModuleSpec::bare("Leaf"), "l", |_| Ok(()))?;
            Ok(())
        })?;
        Ok(())
    });
    let names: Vec<_> = out.circuit.modules().map(|m| out.circuit.resolve(m.name)).collect();
    assert_eq!(names, vec!["Leaf", "Mid", "Top"]);
    assert_lines_in_order(
        &kiln_ir::printer::print_circuit(&out.circuit),
        &["circuit Top :", "module Leaf :", "module Mid :", "inst l of Leaf", "module Top :", "inst m of Mid"],
    );
}
