//! Integration tests for the source exporter: a played story exports
//! to text that reloads into the same observable state.

use fabula_foundation::{FuncId, Value};
use fabula_language::{
    advance_turn, export_source, parse, run_function, Cx, Definitions, MemoryProvider,
};
use fabula_storage::World;

fn load(src: &str) -> (Definitions, World) {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert("story.fab", src);
    let (defs, _) = parse(&mut provider, "story.fab", &mut world).unwrap();
    for block in &defs.game_blocks {
        let mut cx = Cx {
            defs: &defs,
            world: &mut world,
        };
        run_function(&mut cx, *block, &[]);
    }
    (defs, world)
}

fn call(defs: &Definitions, world: &mut World, name: &str, args: &[Value]) -> Value {
    let id = defs
        .functions
        .iter()
        .position(|f| f.name == name)
        .map(|i| FuncId::from_raw(u32::try_from(i).unwrap()))
        .unwrap();
    let mut cx = Cx { defs, world };
    run_function(&mut cx, id, args)
}

#[test]
fn played_stories_resume_from_exported_source() {
    let src = "property oil: Int;\n\
               item lamp;\n\
               var refills: Int = 0;\n\
               function pour(): Void {\n\
               \x20 lamp.oil = lamp.oil + 10;\n\
               \x20 refills = refills + 1;\n\
               }\n\
               function level(): Int => lamp.oil;";
    let (defs, mut world) = load(src);
    call(&defs, &mut world, "pour", &[]);
    call(&defs, &mut world, "pour", &[]);

    let text = export_source(&defs, &world);
    let (defs2, mut world2) = load(&text);
    assert_eq!(
        call(&defs2, &mut world2, "level", &[]),
        call(&defs, &mut world, "level", &[])
    );
    assert_eq!(world2.globals, world.globals);

    // Both copies keep playing in lockstep.
    call(&defs, &mut world, "pour", &[]);
    call(&defs2, &mut world2, "pour", &[]);
    assert_eq!(
        call(&defs2, &mut world2, "level", &[]),
        call(&defs, &mut world, "level", &[])
    );
}

#[test]
fn a_second_export_reproduces_itself() {
    let (defs, mut world) = load(
        "enum Color { red, green, blue }\n\
         map points(Color): Int { red => 1, green => 2, blue => 3 }\n\
         property on: Bool;\n\
         item lamp;\nitem \"a red ball\";\n\
         var score: Int = 0;\n\
         function tally($c: Color): Void { score = score + points($c); }\n\
         command \"wave\" { print(\"You wave.\"); }\n\
         turn { score = score + 0; }\n\
         game { lamp.on = true; }",
    );
    call(&defs, &mut world, "tally", &[Value::new(2)]);

    let first = export_source(&defs, &world);
    let (defs2, world2) = load(&first);
    let second = export_source(&defs2, &world2);
    assert_eq!(first, second);
}

#[test]
fn doc_comments_survive_the_round_trip() {
    let (defs, world) = load(
        "/// The only light source.\nitem lamp;\n\
         /// Adds `$n` to the score.\nfunction add($n: Int): Void { }",
    );
    let text = export_source(&defs, &world);
    let (defs2, world2) = load(&text);
    let lamp = world2.items.lookup("lamp");
    assert_eq!(
        world2.items.get(lamp).unwrap().docs,
        vec!["The only light source."]
    );
    assert_eq!(defs2.functions[1].docs, vec!["Adds `$n` to the score."]);
}

#[test]
fn turn_machinery_survives_the_round_trip() {
    let (defs, world) = load(
        "turn {\n\
         \x20 command \"listen\" { print(\"Wind in the eaves.\"); }\n\
         }",
    );
    let text = export_source(&defs, &world);
    let (defs2, mut world2) = load(&text);
    assert_eq!(defs2.turn_blocks.len(), 1);
    let mut cx = Cx {
        defs: &defs2,
        world: &mut world2,
    };
    advance_turn(&mut cx);
    assert_eq!(world2.registered_commands.len(), 1);
    let registered = world2.registered_commands[0];
    assert_eq!(
        defs2.command(registered).unwrap().trigger.source,
        "listen"
    );
}
