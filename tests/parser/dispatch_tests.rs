//! Trigger scanning and dispatch tests.
//!
//! Top-level commands scan in declaration order, runtime registrations
//! extend the scan, and every placeholder converts before a command is
//! handed back.

use fabula_foundation::{CommandId, Value};
use fabula_language::{advance_turn, parse, Cx, Definitions, MemoryProvider};
use fabula_parser::{Dispatch, Matcher};
use fabula_storage::World;

fn compile(src: &str) -> (Definitions, World) {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert("story.fab", src);
    let (defs, _) = parse(&mut provider, "story.fab", &mut world).unwrap();
    (defs, world)
}

#[test]
fn top_level_triggers_scan_in_declaration_order() {
    let (defs, mut world) = compile(
        "command \"rest\" { print(\"You doze off.\"); }\n\
         command \"rest\" { print(\"Never reached.\"); }",
    );
    let mut matcher = Matcher::default();
    match matcher.dispatch("rest", &defs, &mut world) {
        Dispatch::Run { command, args } => {
            assert_eq!(command, CommandId::from_raw(0));
            assert!(args.is_empty());
        }
        other => panic!("expected the first command, got {other:?}"),
    }
}

#[test]
fn turn_registrations_join_the_scan() {
    let (defs, mut world) = compile(
        "turn {\n\
         \x20 command \"listen\" { print(\"Rain on the roof.\"); }\n\
         }",
    );
    let mut matcher = Matcher::default();
    assert_eq!(
        matcher.dispatch("listen", &defs, &mut world),
        Dispatch::NoMatch
    );

    let mut cx = Cx {
        defs: &defs,
        world: &mut world,
    };
    advance_turn(&mut cx);
    match matcher.dispatch("listen", &defs, &mut world) {
        Dispatch::Run { command, .. } => assert_eq!(command, CommandId::from_raw(0)),
        other => panic!("expected the registered command, got {other:?}"),
    }
}

#[test]
fn typed_placeholders_convert_their_captures() {
    let (defs, mut world) = compile(
        "item innkeeper;\n\
         command \"give {$n: Int} coins to {$who: Item}\" { }\n\
         command \"wager {$n: Int}\" { }",
    );
    let mut matcher = Matcher::default();
    let innkeeper = world.items.lookup("innkeeper");
    match matcher.dispatch("give 3 coins to the innkeeper", &defs, &mut world) {
        Dispatch::Run { args, .. } => {
            assert_eq!(args, vec![Value::new(3), innkeeper.to_value()]);
        }
        other => panic!("expected a dispatch, got {other:?}"),
    }
    match matcher.dispatch("wager -10", &defs, &mut world) {
        Dispatch::Run { args, .. } => assert_eq!(args, vec![Value::new(-10)]),
        other => panic!("expected a dispatch, got {other:?}"),
    }
}

#[test]
fn bad_values_interrupt_the_scan() {
    let (defs, mut world) = compile(
        "command \"count {$n: Int}\" { }\n\
         command \"count {$word: String}\" { }",
    );
    let mut matcher = Matcher::default();
    // The Int trigger matches first; its failed conversion answers the
    // player instead of falling through to the String trigger.
    assert_eq!(
        matcher.dispatch("count many", &defs, &mut world),
        Dispatch::Fail("I don't understand \"many\" here.".to_string())
    );
}

#[test]
fn enum_and_bool_captures_speak_player_language() {
    let (defs, mut world) = compile(
        "enum Mood { calm, tense }\n\
         command \"brood {$m: Mood}\" { }\n\
         command \"answer {$b: Bool}\" { }",
    );
    let mut matcher = Matcher::default();
    match matcher.dispatch("brood TENSE", &defs, &mut world) {
        Dispatch::Run { args, .. } => assert_eq!(args, vec![Value::new(1)]),
        other => panic!("expected a dispatch, got {other:?}"),
    }
    match matcher.dispatch("answer YES", &defs, &mut world) {
        Dispatch::Run { args, .. } => assert_eq!(args, vec![Value::TRUE]),
        other => panic!("expected a dispatch, got {other:?}"),
    }
}

#[test]
fn blank_input_never_matches() {
    let (defs, mut world) = compile("command \"rest\" { }");
    let mut matcher = Matcher::default();
    assert_eq!(matcher.dispatch("", &defs, &mut world), Dispatch::NoMatch);
    assert_eq!(
        matcher.dispatch("  the ...  ", &defs, &mut world),
        Dispatch::NoMatch
    );
}
