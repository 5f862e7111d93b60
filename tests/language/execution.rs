//! Integration tests for the interpreter: whole programs run through
//! the public `run_function` and `advance_turn` entry points.

use fabula_foundation::{CommandId, FuncId, TypeId, Value};
use fabula_language::{
    advance_turn, display_value, parse, run_function, Cx, Definitions, MemoryProvider,
};
use fabula_storage::World;

fn load(src: &str) -> (Definitions, World) {
    let mut world = World::new(0);
    let mut provider = MemoryProvider::new();
    provider.insert("story.fab", src);
    let (defs, _) = parse(&mut provider, "story.fab", &mut world).unwrap();
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

fn run_game_blocks(defs: &Definitions, world: &mut World) {
    for block in &defs.game_blocks {
        let mut cx = Cx { defs, world };
        run_function(&mut cx, *block, &[]);
    }
}

// ============================================================================
// State and arithmetic
// ============================================================================

#[test]
fn state_persists_across_separate_calls() {
    let (defs, mut world) = load(
        "property oil: Int;\n\
         item lamp;\n\
         var refills: Int = 0;\n\
         function pour(): Void {\n\
         \x20 lamp.oil = lamp.oil + 10;\n\
         \x20 refills = refills + 1;\n\
         }\n\
         function level(): Int => lamp.oil;",
    );
    call(&defs, &mut world, "pour", &[]);
    call(&defs, &mut world, "pour", &[]);
    call(&defs, &mut world, "pour", &[]);
    assert_eq!(call(&defs, &mut world, "level", &[]), Value::new(30));
    assert_eq!(world.globals[0], Value::new(3));
}

#[test]
fn extreme_operands_wrap_or_zero() {
    let (defs, mut world) = load(
        "function add($a: Int, $b: Int): Int => $a + $b;\n\
         function div($a: Int, $b: Int): Int => $a / $b;\n\
         function rem($a: Int, $b: Int): Int => $a % $b;",
    );
    let max = Value::new(i64::MAX);
    let min = Value::new(i64::MIN);
    let one = Value::new(1);
    assert_eq!(call(&defs, &mut world, "add", &[max, one]), min);
    // MIN / -1 overflows a two's-complement divide, so it reads as zero
    // just like division by zero does.
    assert_eq!(call(&defs, &mut world, "div", &[min, Value::new(-1)]), Value::new(0));
    assert_eq!(call(&defs, &mut world, "rem", &[min, Value::new(-1)]), Value::new(0));
}

#[test]
fn a_scored_inventory_combines_the_features() {
    let (defs, mut world) = load(
        "enum Size { small, large }\n\
         map bonus(Size): Int { small => 1, large => 5 }\n\
         property size: Size;\n\
         property worth: Int;\n\
         item coin;\nitem gem;\nitem anvil;\n\
         var total: Int = 0;\n\
         game {\n\
         \x20 coin.size = Size.small; coin.worth = 2;\n\
         \x20 gem.size = Size.small; gem.worth = 8;\n\
         \x20 anvil.size = Size.large; anvil.worth = 1;\n\
         }\n\
         function score(): Int {\n\
         \x20 foreach ($x in items where worth > 1) {\n\
         \x20   total = total + $x.worth + bonus($x.size);\n\
         \x20 }\n\
         \x20 return total;\n\
         }",
    );
    run_game_blocks(&defs, &mut world);
    // coin (2 + 1) and gem (8 + 1); the anvil's worth is too low.
    assert_eq!(call(&defs, &mut world, "score", &[]), Value::new(12));
}

#[test]
fn maps_route_delegates_at_runtime() {
    let (defs, mut world) = load(
        "delegate Reply(): String;\n\
         enum Mood { calm, tense }\n\
         function soothe(): String => \"\\\"Welcome, traveler.\\\"\";\n\
         function snap(): String => \"\\\"What do you want?\\\"\";\n\
         map react(Mood): Reply { calm => soothe, tense => snap }\n\
         function greet($mood: Mood): String {\n\
         \x20 var $reply: Reply = react($mood);\n\
         \x20 return $reply();\n\
         }",
    );
    assert_eq!(
        call(&defs, &mut world, "greet", &[Value::new(1)]),
        world.interner.get("\"What do you want?\"").unwrap().to_value()
    );
}

// ============================================================================
// Turn advancement
// ============================================================================

#[test]
fn turn_blocks_run_in_declaration_order() {
    let (defs, mut world) = load(
        "turn { print(\"the east wind rises\"); }\n\
         turn { print(\"the tide follows\"); }",
    );
    let mut cx = Cx {
        defs: &defs,
        world: &mut world,
    };
    advance_turn(&mut cx);
    assert_eq!(world.turn, 1);
    assert_eq!(
        world.drain_output(),
        ["the east wind rises", "the tide follows"]
    );
}

#[test]
fn advance_turn_lets_turn_blocks_register_commands() {
    let (defs, mut world) = load(
        "turn {\n\
         \x20 command \"shout\" { print(\"Echoes answer.\"); }\n\
         }",
    );
    // A registration left over from the previous turn is forgotten, then
    // the turn block runs and registers afresh.
    world.registered_commands.push(CommandId::from_raw(99));
    let mut cx = Cx {
        defs: &defs,
        world: &mut world,
    };
    advance_turn(&mut cx);
    assert_eq!(world.registered_commands, vec![CommandId::from_raw(0)]);
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn display_value_renders_every_kind() {
    let (defs, mut world) = load(
        "enum Mood { calm, tense }\n\
         delegate Op(): Void;\n\
         function wave(): Void { }\n\
         item lamp;\n\
         game { lamp.name = \"a brass lamp\"; }",
    );
    run_game_blocks(&defs, &mut world);
    let mood = defs.enums[0].ty;
    let op = defs.delegates[0].ty;
    let lamp = world.items.lookup("lamp");
    let hello = world.interner.intern("hello").to_value();

    assert_eq!(display_value(&defs, &world, TypeId::INT, Value::new(-4)), "-4");
    assert_eq!(display_value(&defs, &world, TypeId::BOOL, Value::TRUE), "true");
    assert_eq!(display_value(&defs, &world, TypeId::STRING, hello), "hello");
    assert_eq!(
        display_value(&defs, &world, TypeId::ITEM, lamp.to_value()),
        "a brass lamp"
    );
    assert_eq!(
        display_value(&defs, &world, TypeId::ITEM, Value::NULL),
        "null"
    );
    assert_eq!(display_value(&defs, &world, mood, Value::new(1)), "tense");
    assert_eq!(
        display_value(&defs, &world, op, FuncId::from_raw(1).to_value()),
        "wave"
    );
}
