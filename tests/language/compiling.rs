//! Integration tests for the compiler, driven through the public
//! `parse` entry point with in-memory sources.

use fabula_foundation::{ItemId, TypeId, Value};
use fabula_language::expr::Expr;
use fabula_language::stmt::Statement;
use fabula_language::{parse, Definitions, MemoryProvider};
use fabula_storage::World;

fn compile(src: &str) -> (Definitions, World) {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert("story.fab", src);
    let (defs, warnings) = parse(&mut provider, "story.fab", &mut world).unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    (defs, world)
}

fn compile_err(src: &str) -> String {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert("story.fab", src);
    parse(&mut provider, "story.fab", &mut world)
        .unwrap_err()
        .to_string()
}

// ============================================================================
// Whole programs
// ============================================================================

#[test]
fn whole_programs_compile_through_the_public_surface() {
    let (defs, world) = compile(
        "enum Mood { calm, tense }\n\
         map greeting(Mood): String { calm => \"Hello.\", tense => \"What?\" }\n\
         property mood: Mood;\n\
         item innkeeper;\n\
         item \"a brass key\";\n\
         var score: Int = 0;\n\
         const title: String = \"The Inn\";\n\
         function bump(): Void { score = score + 1; }\n\
         command \"talk to {$who: Item}\" { print(greeting($who.mood)); }\n\
         game { print(title); }\n\
         turn { bump(); }\n",
    );
    // Null function, bump, the command body, the game block, the turn block.
    assert_eq!(defs.functions.len(), 5);
    assert_eq!(defs.commands.len(), 1);
    assert!(defs.commands[0].top_level);
    assert_eq!(defs.maps.len(), 1);
    assert_eq!(defs.globals.len(), 1);
    assert_eq!(defs.enums.len(), 1);
    assert_eq!(defs.game_blocks.len(), 1);
    assert_eq!(defs.turn_blocks.len(), 1);
    assert_eq!(world.items.count(), 2);
    assert_eq!(world.items.lookup("innkeeper").index(), 1);
    assert!(!world.items.is_bare(world.items.lookup("a brass key")));
    assert_eq!(world.globals, vec![Value::new(0)]);
    let mood = defs.enums[0].ty;
    assert_eq!(world.types.enum_values(mood), ["calm", "tense"]);
}

#[test]
fn shorthand_bodies_fold_to_single_returns() {
    let (defs, _) = compile("function f(): Int => 2 + 3 * 4;");
    assert!(defs.functions[1].shorthand);
    assert_eq!(
        defs.functions[1].code,
        vec![Statement::ReturnValue {
            value: Expr::Literal {
                value: Value::new(14),
                ty: TypeId::INT,
            },
        }]
    );
}

#[test]
fn map_lookups_are_total_over_their_enum() {
    let (defs, _) = compile(
        "enum Size { small, medium, large }\n\
         map price(Size): Int { small => 5, medium => 8, large => 12 }\n",
    );
    let price = &defs.maps[0];
    assert_eq!(price.table.len(), 3);
    assert_eq!(price.lookup(Value::new(0)), Value::new(5));
    assert_eq!(price.lookup(Value::new(2)), Value::new(12));
    assert_eq!(price.lookup(Value::new(9)), Value::NULL);
}

#[test]
fn doc_comments_attach_to_declarations() {
    let (defs, world) = compile(
        "/// The only light source.\nitem lamp;\n\
         /// Burns one unit of oil.\nfunction burn(): Void { }\n",
    );
    let lamp = world.items.lookup("lamp");
    assert_eq!(
        world.items.get(lamp).unwrap().docs,
        vec!["The only light source."]
    );
    assert_eq!(defs.functions[1].docs, vec!["Burns one unit of oil."]);
}

// ============================================================================
// Includes and literate sources
// ============================================================================

#[test]
fn includes_assemble_a_story_from_many_files() {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert(
        "story.fab",
        "include \"items.fab\";\ninclude \"verbs.fab\";\nvar turns: Int = 0;",
    );
    provider.insert("items.fab", "item lamp;\nitem table;");
    provider.insert(
        "verbs.fab",
        "include \"items.fab\";\ncommand \"look\" { print(\"A bare room.\"); }",
    );
    let (defs, warnings) = parse(&mut provider, "story.fab", &mut world).unwrap();
    assert!(warnings.is_empty());
    // items.fab loads once even though two files include it.
    assert_eq!(world.items.count(), 2);
    assert_eq!(world.items.lookup("lamp").index(), 1);
    assert_eq!(defs.commands.len(), 1);
    assert_eq!(defs.globals.len(), 1);
}

#[test]
fn literate_markdown_compiles_like_plain_source() {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert(
        "story.md",
        "# The Cellar\n\nSee [the props](props.md) for furniture.\n\n\
         ```\nitem lamp;\ncommand \"look\" { print(\"Dark.\"); }\n```\n",
    );
    provider.insert("props.md", "Props live here.\n\n```\nitem barrel;\n```\n");
    let (defs, _) = parse(&mut provider, "story.md", &mut world).unwrap();
    assert_eq!(world.items.count(), 2);
    assert_ne!(world.items.lookup("barrel"), ItemId::NULL);
    assert_eq!(defs.commands.len(), 1);
}

// ============================================================================
// Errors and warnings
// ============================================================================

#[test]
fn compile_errors_name_the_file_and_position() {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert("story.fab", "include \"broken.fab\";");
    provider.insert("broken.fab", "item lamp;\nitem lamp;");
    let err = parse(&mut provider, "story.fab", &mut world)
        .unwrap_err()
        .to_string();
    assert!(err.starts_with("broken.fab(2,"), "{err}");
    assert!(err.contains("already declared"), "{err}");
}

#[test]
fn maps_must_cover_their_whole_enum() {
    let err = compile_err(
        "enum Color { red, green, blue }\n\
         map points(Color): Int { red => 1, blue => 3 }",
    );
    assert!(err.contains("missing an entry for `green`"), "{err}");
}

#[test]
fn loop_jumps_need_an_enclosing_loop() {
    let err = compile_err("function f(): Void { break; }");
    assert!(err.contains("`break` outside a loop"), "{err}");
    let err = compile_err("function f(): Void { continue; }");
    assert!(err.contains("`continue` outside a loop"), "{err}");
}

#[test]
fn reused_names_report_the_earlier_kind() {
    let err = compile_err("var score: Int = 0;\nfunction score(): Void { }");
    assert!(err.contains("`score` is already a variable"), "{err}");
}

#[test]
fn warnings_accumulate_without_failing_the_parse() {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert(
        "story.fab",
        "/// Lights `$lamp` if it is dark.\nfunction light(): Void { }",
    );
    let (defs, warnings) = parse(&mut provider, "story.fab", &mut world).unwrap();
    assert_eq!(defs.functions.len(), 2);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("unknown parameter `$lamp`"), "{}", warnings[0]);
}
