use super::{FieldValue, NoteEvent};

/// A structural filter over [`NoteEvent`]s.
///
/// An event matches when it has every field of the pattern with an equal value. The empty
/// pattern matches every event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pattern {
    fields: Vec<(String, FieldValue)>,
}

impl Pattern {
    /// The empty pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field, replacing any previous requirement on the same field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    /// The required fields, in the order they were added
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// True if the pattern places no requirement
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True if `event` carries every field of the pattern with an equal value
    pub fn matches(&self, event: &NoteEvent) -> bool {
        self.fields
            .iter()
            .all(|(name, expected)| event.get(name).is_some_and(|value| *value == *expected))
    }
}

impl<K, V> FromIterator<(K, V)> for Pattern
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Pattern::new(), |pattern, (k, v)| pattern.with(k, v))
    }
}

#[test]
fn superset_matching() {
    let a = NoteEvent::note_on(0, 12, 0., 100);
    let b = NoteEvent::note_off(0, 12, 10.);
    let c = NoteEvent::note_on(0, 14, 20., 100);

    let twelve = Pattern::new().with("note", 12);
    assert!(twelve.matches(&a));
    assert!(twelve.matches(&b));
    assert!(!twelve.matches(&c));

    let everything = Pattern::new();
    assert!([&a, &b, &c].iter().all(|e| everything.matches(e)));

    let note_on_twelve: Pattern = [("note", FieldValue::from(12)), ("type", "noteOn".into())]
        .into_iter()
        .collect();
    assert!(note_on_twelve.matches(&a));
    assert!(!note_on_twelve.matches(&b));
}

#[test]
fn unset_optional_fields_never_match() {
    let off = NoteEvent::note_off(0, 12, 10.);
    assert!(!Pattern::new().with("length", 0.).matches(&off));
    assert!(!Pattern::new().with("velocity", 0).matches(&off));
}
