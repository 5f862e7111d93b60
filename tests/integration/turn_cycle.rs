//! Turn-cycle tests: load-time blocks, contextual command lifetimes,
//! and script-driven ticks.

use fabula::foundation::Value;
use fabula::Story;

#[test]
fn game_blocks_run_before_the_first_turn() {
    let mut story = Story::load_str(
        "game { print(\"once\"); }\n\
         turn { print(\"every turn\"); }",
    )
    .unwrap();
    assert_eq!(story.output(), vec!["once", "every turn"]);
    assert_eq!(story.turn(), 1);

    assert_eq!(story.tick(), vec!["every turn"]);
    assert_eq!(story.turn(), 2);
}

#[test]
fn contextual_commands_expire_with_their_turn() {
    let mut story = Story::load_str(
        "var knocked: Bool = false;\n\
         var entered: Bool = false;\n\
         turn {\n\
         \x20 if (knocked && !entered) {\n\
         \x20   command \"enter\" {\n\
         \x20     entered = true;\n\
         \x20     print(\"You step inside.\");\n\
         \x20   }\n\
         \x20 }\n\
         }\n\
         command \"knock\" {\n\
         \x20 knocked = true;\n\
         \x20 print(\"The door creaks open.\");\n\
         }",
    )
    .unwrap();
    // Nothing to enter yet.
    assert_eq!(story.command("enter"), vec!["I don't understand that."]);

    assert_eq!(story.command("knock"), vec!["The door creaks open."]);
    assert_eq!(story.command("enter"), vec!["You step inside."]);

    // The offer was withdrawn when the next turn began.
    assert_eq!(story.command("enter"), vec!["I don't understand that."]);
}

#[test]
fn script_ticks_stack_with_the_turn_cycle() {
    let mut story = Story::load_str(
        "var beats: Int = 0;\n\
         turn { beats = beats + 1; }\n\
         command \"wait\" { tick(); }",
    )
    .unwrap();
    assert_eq!(story.turn(), 1);

    // The scripted tick closes one turn, then the command's own
    // completion closes another.
    assert!(story.command("wait").is_empty());
    assert_eq!(story.turn(), 3);
    assert_eq!(story.world().globals[0], Value::new(3));
}

#[test]
fn failed_input_keeps_the_turn_open() {
    let mut story = Story::load_str(
        "item lamp;\n\
         command \"take {$x: Item}\" { }\n\
         command \"push {$n: Int}\" { }",
    )
    .unwrap();
    let turn = story.turn();

    assert_eq!(story.command("sing"), vec!["I don't understand that."]);
    assert_eq!(
        story.command("take sword"),
        vec!["You can't see any sword here."]
    );
    assert_eq!(
        story.command("push hard"),
        vec!["I don't understand \"hard\" here."]
    );
    assert_eq!(story.turn(), turn);
}
