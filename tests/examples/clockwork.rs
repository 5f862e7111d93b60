//! A clockwork boiler driven by the turn cycle.
//!
//! Demonstrates:
//! - Turn-init blocks advancing machine state once per turn
//! - Message order: a command's own output before the turn block's
//! - `tick()` spending an extra turn inside a command body
//! - Story-authored refusals closing the turn while unparsed input
//!   leaves it open

use fabula::Story;
use fabula::foundation::Value;

const BOILER: &str = "\
    /// The boiler's running state.\n\
    enum Phase { cold, heating, ready }\n\
    \n\
    var phase: Phase = Phase.cold;\n\
    var pressure: Int = 0;\n\
    var beats: Int = 0;\n\
    \n\
    map describe(Phase): String {\n\
    \x20 cold => \"The boiler sits cold.\",\n\
    \x20 heating => \"Pipes knock as pressure builds.\",\n\
    \x20 ready => \"The needle trembles at the red line.\"\n\
    }\n\
    \n\
    turn {\n\
    \x20 beats = beats + 1;\n\
    \x20 if (phase == Phase.heating) {\n\
    \x20   pressure = pressure + 7;\n\
    \x20   if (pressure >= 21) {\n\
    \x20     phase = Phase.ready;\n\
    \x20     print(\"The needle touches the red line.\");\n\
    \x20   }\n\
    \x20 }\n\
    }\n\
    \n\
    command \"light the boiler\" {\n\
    \x20 if (phase == Phase.cold) {\n\
    \x20   phase = Phase.heating;\n\
    \x20   print(\"The burner catches.\");\n\
    \x20 } else {\n\
    \x20   print(\"It is already lit.\");\n\
    \x20 }\n\
    }\n\
    \n\
    command \"read the gauge\" { print(describe(phase)); }\n\
    \n\
    command \"wait\" { tick(); }\n\
    \n\
    command \"vent the steam\" {\n\
    \x20 if (phase == Phase.ready) {\n\
    \x20   phase = Phase.cold;\n\
    \x20   pressure = 0;\n\
    \x20   print(\"Steam howls out. The boiler settles.\");\n\
    \x20 } else {\n\
    \x20   print(\"The valve is stiff and nothing comes.\");\n\
    \x20 }\n\
    }\n";

#[test]
fn the_boiler_comes_up_to_pressure() {
    let mut story = Story::load_str(BOILER).unwrap();
    assert!(story.warnings().is_empty());
    assert_eq!(story.turn(), 1);

    assert_eq!(story.command("light the boiler"), ["The burner catches."]);
    assert_eq!(
        story.command("read the gauge"),
        ["Pipes knock as pressure builds."]
    );
    // The second reading still sees `heating`; the turn block crosses
    // the line afterwards, so its message lands behind the gauge's.
    assert_eq!(
        story.command("read the gauge"),
        [
            "Pipes knock as pressure builds.",
            "The needle touches the red line."
        ]
    );
    assert_eq!(
        story.command("read the gauge"),
        ["The needle trembles at the red line."]
    );
    assert_eq!(
        story.command("vent the steam"),
        ["Steam howls out. The boiler settles."]
    );

    let world = story.world();
    assert_eq!(world.globals[0], Value::new(0));
    assert_eq!(world.globals[1], Value::new(0));
}

#[test]
fn waiting_spends_two_turns() {
    let mut story = Story::load_str(BOILER).unwrap();
    assert_eq!(story.turn(), 1);

    assert!(story.command("wait").is_empty());
    assert_eq!(story.turn(), 3);
    // `beats` counts one per turn, including the turn the load closed.
    assert_eq!(story.world().globals[2], Value::new(3));
}

#[test]
fn refusals_close_the_turn_but_nonsense_does_not() {
    let mut story = Story::load_str(BOILER).unwrap();

    assert_eq!(story.command("polish the orb"), ["I don't understand that."]);
    assert_eq!(story.turn(), 1);

    assert_eq!(
        story.command("vent the steam"),
        ["The valve is stiff and nothing comes."]
    );
    assert_eq!(story.turn(), 2);
}
