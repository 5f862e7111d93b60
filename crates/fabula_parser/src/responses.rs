//! Player-facing failure messages.
//!
//! Every recoverable input failure renders one of four templates.
//! Hosts swap the wording (translation, tone) without touching the
//! dispatch logic; `{0}` marks where the offending phrase or the
//! candidate list lands.

/// Substitutes `value` for every `{0}` in the template.
#[must_use]
pub fn fill(template: &str, value: &str) -> String {
    template.replace("{0}", value)
}

/// Message templates for the four input failure cases.
#[derive(Clone, Debug)]
pub struct Responses {
    /// No trigger matched the input. No substitution.
    pub no_match: String,

    /// A noun phrase resolved to no item. `{0}` is the phrase.
    pub cant_find: String,

    /// A noun phrase fit several items. `{0}` lists their display
    /// names in declaration order.
    pub which: String,

    /// An argument failed its type's conversion. `{0}` is the
    /// offending text.
    pub bad_value: String,
}

impl Default for Responses {
    fn default() -> Self {
        Self {
            no_match: "I don't understand that.".to_string(),
            cant_find: "You can't see any {0} here.".to_string(),
            which: "Which do you mean: {0}?".to_string(),
            bad_value: "I don't understand \"{0}\" here.".to_string(),
        }
    }
}

impl Responses {
    /// Builder method to set the unmatched-input message.
    #[must_use]
    pub fn with_no_match(mut self, template: impl Into<String>) -> Self {
        self.no_match = template.into();
        self
    }

    /// Builder method to set the unknown-item message.
    #[must_use]
    pub fn with_cant_find(mut self, template: impl Into<String>) -> Self {
        self.cant_find = template.into();
        self
    }

    /// Builder method to set the ambiguous-item message.
    #[must_use]
    pub fn with_which(mut self, template: impl Into<String>) -> Self {
        self.which = template.into();
        self
    }

    /// Builder method to set the bad-argument message.
    #[must_use]
    pub fn with_bad_value(mut self, template: impl Into<String>) -> Self {
        self.bad_value = template.into();
        self
    }
}
