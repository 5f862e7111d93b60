//! Whole-story scenarios driven through the [`Story`] facade.

use fabula::foundation::{PropId, Value};
use fabula::language::MemoryProvider;
use fabula::{MatchConfig, Responses, Story};

#[test]
fn the_lamp_scenario_runs_end_to_end() {
    let mut story = Story::load_str(
        "item lamp;\n\
         property on: Bool;\n\
         command \"turn on {$x: Item}\" { $x.on = true; }",
    )
    .unwrap();
    let lamp = story.world().items.lookup("lamp");
    let on = PropId::from_raw(1);

    assert!(story.command("turn on lamp").is_empty());
    assert_eq!(story.world().props.get(lamp, on), Value::TRUE);

    // An unknown noun answers the player and touches nothing.
    let turn = story.turn();
    assert_eq!(
        story.command("turn on nothing"),
        vec!["You can't see any nothing here."]
    );
    assert_eq!(story.world().props.get(lamp, on), Value::TRUE);
    assert_eq!(story.turn(), turn);
}

#[test]
fn a_small_adventure_plays_through() {
    let mut story = Story::load_str(
        "enum Glow { faint, steady }\n\
         map describe(Glow): String { faint => \"a faint glow\", steady => \"a steady light\" }\n\
         property on: Bool;\n\
         property glow: Glow;\n\
         item \"a brass lamp\";\n\
         item \"an iron key\";\n\
         var moves: Int = 0;\n\
         game {\n\
         \x20 print(\"The cellar is black.\");\n\
         }\n\
         turn {\n\
         \x20 moves = moves + 1;\n\
         \x20 if (item(\"a brass lamp\").on) {\n\
         \x20   command \"read the walls\" {\n\
         \x20     print(\"Scratched letters spell DIG.\");\n\
         \x20   }\n\
         \x20 }\n\
         }\n\
         command \"light {$x: Item}\" {\n\
         \x20 $x.on = true;\n\
         \x20 $x.glow = Glow.steady;\n\
         \x20 print(`The wick catches with {describe($x.glow)}.`);\n\
         }\n\
         command \"wait\" { }",
    )
    .unwrap();
    assert_eq!(story.output(), vec!["The cellar is black."]);
    assert_eq!(story.turn(), 1);

    // The lamp is dark, so the wall inscription is out of reach.
    assert_eq!(story.command("read the walls"), vec!["I don't understand that."]);
    assert_eq!(story.turn(), 1);

    assert_eq!(
        story.command("light the brass lamp"),
        vec!["The wick catches with a steady light."]
    );
    assert_eq!(story.turn(), 2);

    assert_eq!(
        story.command("read the walls"),
        vec!["Scratched letters spell DIG."]
    );
    assert!(story.command("wait").is_empty());
    assert_eq!(story.turn(), 4);
    // One `moves` beat per closed turn.
    assert_eq!(story.world().globals[0], Value::new(4));
}

#[test]
fn configured_stories_change_their_voice() {
    let mut provider = MemoryProvider::new();
    provider.insert(
        "story.fab",
        "command \"rest\" { print(\"You settle down.\"); }",
    );
    let config = MatchConfig::default().with_stop_words(vec![
        "kindly".to_string(),
        "the".to_string(),
    ]);
    let responses = Responses::default().with_no_match("Hmm?");
    let mut story = Story::load_with(&mut provider, "story.fab", 0, config, responses).unwrap();

    assert_eq!(story.command("kindly rest"), vec!["You settle down."]);
    assert_eq!(story.command("dance"), vec!["Hmm?"]);
}
