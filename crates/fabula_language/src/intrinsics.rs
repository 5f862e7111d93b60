//! Built-in functions available to every story.

use fabula_foundation::TypeId;

/// A function the engine provides rather than the story.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    /// `print(text)` appends a message to the world's output.
    Print,
    /// `item(name)` looks an item up by declared name at run time.
    ItemLookup,
    /// `random(bound)` draws from the world's seeded generator.
    Random,
    /// `count()` counts declared items, excluding the null item.
    Count,
    /// `tick()` advances the turn and runs turn-init blocks.
    Tick,
    /// `rectangle(canvas, x, y, w, h, fill, stroke, strokeWidth)`.
    Rectangle,
    /// `ellipse(canvas, x, y, w, h, fill, stroke, strokeWidth)`.
    Ellipse,
}

const SHAPE_PARAMS: &[TypeId] = &[
    TypeId::STRING,
    TypeId::INT,
    TypeId::INT,
    TypeId::INT,
    TypeId::INT,
    TypeId::STRING,
    TypeId::STRING,
    TypeId::INT,
];

impl Intrinsic {
    /// Intrinsics resolvable through the declaration table. `item(...)`
    /// is absent: `item` is a declaration keyword, and the parser turns
    /// it into [`Intrinsic::ItemLookup`] only when a call follows.
    pub const NAMED: &'static [(&'static str, Intrinsic)] = &[
        ("print", Intrinsic::Print),
        ("random", Intrinsic::Random),
        ("count", Intrinsic::Count),
        ("tick", Intrinsic::Tick),
        ("rectangle", Intrinsic::Rectangle),
        ("ellipse", Intrinsic::Ellipse),
    ];

    /// The callable name, as it appears in source.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Print => "print",
            Intrinsic::ItemLookup => "item",
            Intrinsic::Random => "random",
            Intrinsic::Count => "count",
            Intrinsic::Tick => "tick",
            Intrinsic::Rectangle => "rectangle",
            Intrinsic::Ellipse => "ellipse",
        }
    }

    /// Expected argument types, in order.
    #[must_use]
    pub fn params(self) -> &'static [TypeId] {
        match self {
            Intrinsic::Print | Intrinsic::ItemLookup => &[TypeId::STRING],
            Intrinsic::Random => &[TypeId::INT],
            Intrinsic::Count | Intrinsic::Tick => &[],
            Intrinsic::Rectangle | Intrinsic::Ellipse => SHAPE_PARAMS,
        }
    }

    /// Result type of a call.
    #[must_use]
    pub fn ret(self) -> TypeId {
        match self {
            Intrinsic::ItemLookup => TypeId::ITEM,
            Intrinsic::Random | Intrinsic::Count => TypeId::INT,
            Intrinsic::Print
            | Intrinsic::Tick
            | Intrinsic::Rectangle
            | Intrinsic::Ellipse => TypeId::VOID,
        }
    }

    /// Whether a call changes the world rather than merely reading it.
    #[must_use]
    pub fn has_effect(self) -> bool {
        matches!(
            self,
            Intrinsic::Print | Intrinsic::Tick | Intrinsic::Rectangle | Intrinsic::Ellipse
        )
    }
}
