use std::fmt::Debug;
use std::marker::PhantomData;

/// A closed set of named nesting regions that one schema cares about.
///
/// Implementors are fieldless enums; `index` must be unique per variant and
/// below 32. Exactly one variant, `BOUNDARY`, marks the record boundary.
pub trait Context: Copy + Eq + Debug + Send + 'static {
    const ALL: &'static [Self];
    const BOUNDARY: Self;

    /// Object name that opens and closes this context.
    fn tag(self) -> &'static str;

    fn index(self) -> u32;

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|context| context.tag() == tag)
    }
}

/// Open/closed flags for every context of `C`.
///
/// A context is either open somewhere in the ancestor chain or it is not;
/// depth is not counted.
pub struct ContextSet<C> {
    open: u32,
    _marker: PhantomData<C>,
}

impl<C: Context> ContextSet<C> {
    pub fn new() -> Self {
        Self {
            open: 0,
            _marker: PhantomData,
        }
    }

    /// Marks the context named `tag` open. Returns false for untracked names.
    pub fn open(&mut self, tag: &str) -> bool {
        match C::from_tag(tag) {
            Some(context) => {
                self.open |= 1 << context.index();
                true
            }
            None => false,
        }
    }

    /// Marks the context named `tag` closed and reports whether this closed a
    /// previously opened record boundary.
    pub fn close(&mut self, tag: &str) -> bool {
        let Some(context) = C::from_tag(tag) else {
            return false;
        };
        let completes = context == C::BOUNDARY && self.is_open(context);
        self.open &= !(1 << context.index());
        completes
    }

    pub fn is_open(&self, context: C) -> bool {
        self.open & (1 << context.index()) != 0
    }

    pub fn any_open(&self) -> bool {
        self.open != 0
    }

    pub fn clear(&mut self) {
        self.open = 0;
    }
}

impl<C: Context> Default for ContextSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Context> Debug for ContextSet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(C::ALL.iter().filter(|context| self.is_open(**context)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shape {
        Record,
        Inner,
    }

    impl Context for Shape {
        const ALL: &'static [Self] = &[Shape::Record, Shape::Inner];
        const BOUNDARY: Self = Shape::Record;

        fn tag(self) -> &'static str {
            match self {
                Shape::Record => "record",
                Shape::Inner => "inner",
            }
        }

        fn index(self) -> u32 {
            self as u32
        }
    }

    #[test]
    fn test_untracked_names_pass_through() {
        let mut set = ContextSet::<Shape>::new();
        assert!(!set.open("other"));
        assert!(!set.close("other"));
        assert!(!set.any_open());
    }

    #[test]
    fn test_boundary_completes_only_when_opened() {
        let mut set = ContextSet::<Shape>::new();
        assert!(!set.close("record"));

        assert!(set.open("record"));
        assert!(set.open("inner"));
        assert!(!set.close("inner"));
        assert!(set.is_open(Shape::Record));
        assert!(set.close("record"));
        assert!(!set.close("record"));
        assert!(!set.any_open());
    }

    #[test]
    fn test_clear() {
        let mut set = ContextSet::<Shape>::new();
        set.open("inner");
        assert!(set.any_open());
        set.clear();
        assert!(!set.is_open(Shape::Inner));
        assert_eq!(format!("{set:?}"), "{}");
    }
}
