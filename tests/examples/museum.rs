//! A two-room museum assembled from an include graph.
//!
//! Demonstrates:
//! - Includes pulling rooms and relics into one story
//! - Map-driven room descriptions keyed by an enum
//! - Adjective disambiguation between look-alike relics
//! - Renaming through the `name` property
//! - A contextual command registered by a turn block, feeding shapes
//!   to a host canvas
//! - Saving mid-visit and resuming from the exported source

use fabula::language::MemoryProvider;
use fabula::storage::Shape;
use fabula::{MatchConfig, Responses, Story};

const ROOMS: &str = "\
    /// Where the visitor stands.\n\
    enum Room { hall, vault }\n\
    \n\
    var spot: Room = Room.hall;\n\
    \n\
    map tour(Room): String {\n\
    \x20 hall => \"Portraits glower across the entrance hall.\",\n\
    \x20 vault => \"The vault hums behind glass cases.\"\n\
    }\n\
    \n\
    turn {\n\
    \x20 if (spot == Room.vault) {\n\
    \x20   command \"sketch the cases\" {\n\
    \x20     rectangle(\"plan\", 4, 4, 24, 12, \"parchment\", \"ink\", 1);\n\
    \x20     ellipse(\"plan\", 10, 7, 6, 6, \"parchment\", \"ink\", 1);\n\
    \x20     print(\"You rough in the case layout.\");\n\
    \x20   }\n\
    \x20 }\n\
    }\n";

const RELICS: &str = "\
    item \"a tin crown\";\n\
    item \"a tin whistle\";\n\
    item \"a jade whistle\";\n";

const MUSEUM: &str = "\
    include \"rooms.fab\";\n\
    include \"relics.fab\";\n\
    \n\
    game {\n\
    \x20 print(\"The Musty Museum\");\n\
    }\n\
    \n\
    command \"look\" { print(tour(spot)); }\n\
    \n\
    command \"go north\" {\n\
    \x20 if (spot == Room.hall) {\n\
    \x20   spot = Room.vault;\n\
    \x20   print(tour(spot));\n\
    \x20 } else {\n\
    \x20   print(\"The wall disagrees.\");\n\
    \x20 }\n\
    }\n\
    \n\
    command \"go south\" {\n\
    \x20 if (spot == Room.vault) {\n\
    \x20   spot = Room.hall;\n\
    \x20   print(tour(spot));\n\
    \x20 } else {\n\
    \x20   print(\"Only shelves that way.\");\n\
    \x20 }\n\
    }\n\
    \n\
    command \"examine {$x: Item}\" { print(`Dust lifts from {$x}.`); }\n\
    \n\
    command \"polish {$x: Item}\" {\n\
    \x20 $x.name = \"a gleaming treasure\";\n\
    \x20 print(\"It shines.\");\n\
    }\n";

fn visit() -> Story {
    let mut provider = MemoryProvider::new();
    provider.insert("museum.fab", MUSEUM);
    provider.insert("rooms.fab", ROOMS);
    provider.insert("relics.fab", RELICS);
    let story = Story::load_with(
        &mut provider,
        "museum.fab",
        0,
        MatchConfig::default(),
        Responses::default(),
    )
    .unwrap();
    assert!(story.warnings().is_empty());
    story
}

#[test]
fn the_tour_moves_between_rooms() {
    let mut story = visit();
    assert_eq!(story.output(), ["The Musty Museum"]);

    assert_eq!(
        story.command("look"),
        ["Portraits glower across the entrance hall."]
    );
    assert_eq!(
        story.command("go north"),
        ["The vault hums behind glass cases."]
    );
    assert_eq!(story.command("go north"), ["The wall disagrees."]);
    assert_eq!(
        story.command("go south"),
        ["Portraits glower across the entrance hall."]
    );
    assert_eq!(story.turn(), 5);
}

#[test]
fn whistles_need_an_adjective() {
    let mut story = visit();
    story.output();

    assert_eq!(
        story.command("examine the whistle"),
        ["Which do you mean: a tin whistle, a jade whistle?"]
    );
    assert_eq!(story.turn(), 1);

    assert_eq!(
        story.command("examine the jade whistle"),
        ["Dust lifts from a jade whistle."]
    );
    // A bare noun is fine when only one relic owns it.
    assert_eq!(
        story.command("examine the crown"),
        ["Dust lifts from a tin crown."]
    );
}

#[test]
fn polishing_renames_for_the_next_command() {
    let mut story = visit();
    story.output();

    assert_eq!(story.command("polish the tin crown"), ["It shines."]);
    assert_eq!(
        story.command("examine the gleaming treasure"),
        ["Dust lifts from a gleaming treasure."]
    );
    assert_eq!(
        story.command("examine the crown"),
        ["You can't see any crown here."]
    );
    assert_eq!(story.turn(), 3);
}

#[test]
fn sketching_needs_the_vault() {
    let mut story = visit();
    story.output();

    assert_eq!(
        story.command("sketch the cases"),
        ["I don't understand that."]
    );
    assert_eq!(
        story.command("go north"),
        ["The vault hums behind glass cases."]
    );
    assert_eq!(
        story.command("sketch the cases"),
        ["You rough in the case layout."]
    );

    let plan = story.world().drawings.canvas("plan");
    assert_eq!(plan.len(), 2);
    assert_eq!(
        plan[0],
        Shape::Rect {
            x: 4,
            y: 4,
            width: 24,
            height: 12,
            fill: "parchment".to_string(),
            stroke: "ink".to_string(),
            stroke_width: 1,
        }
    );
    assert!(matches!(plan[1], Shape::Ellipse { .. }));

    assert_eq!(
        story.command("go south"),
        ["Portraits glower across the entrance hall."]
    );
    assert_eq!(
        story.command("sketch the cases"),
        ["I don't understand that."]
    );
}

#[test]
fn a_saved_visit_resumes_where_it_left_off() {
    let mut story = visit();
    story.output();
    story.command("go north");
    story.command("polish the tin crown");

    let saved = story.export();
    let mut resumed = Story::load_str(&saved).unwrap();

    // The banner game block is not replayed; its effect was output,
    // which a save does not carry.
    assert!(resumed.output().is_empty());
    assert_eq!(
        resumed.command("look"),
        ["The vault hums behind glass cases."]
    );
    assert_eq!(
        resumed.command("examine the gleaming treasure"),
        ["Dust lifts from a gleaming treasure."]
    );
}
