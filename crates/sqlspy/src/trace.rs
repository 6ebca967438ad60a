//! Per-statement record of bound parameters.

use parking_lot::Mutex;

/// Highest parameter index that is traced.
///
/// Wire protocols count parameters in 16 bits; larger indices are left to
/// the driver to reject.
pub const MAX_TRACED_INDEX: usize = 65_535;

/// Bound parameter values, already rendered as SQL literals.
///
/// Slots are 0-based internally; the public binding API is 1-based.
/// Slots skipped by out-of-order binding hold `None` and render as `?`.
///
/// All access goes through an internal lock, so a registry dump on another
/// thread can render while the owning thread binds.
#[derive(Debug, Default)]
pub struct ArgumentTrace {
    slots: Mutex<Vec<Option<String>>>,
}

impl ArgumentTrace {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Store the rendered value for 1-based parameter `index`.
    ///
    /// Index 0 and indices above [`MAX_TRACED_INDEX`] are ignored.
    pub fn set(&self, index: usize, rendered: impl Into<String>) {
        if index > MAX_TRACED_INDEX {
            return;
        }
        let Some(slot) = index.checked_sub(1) else {
            return;
        };
        let mut slots = self.slots.lock();
        if slots.len() <= slot {
            slots.resize(slot + 1, None);
        }
        slots[slot] = Some(rendered.into());
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Number of slots, bound or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Substitute each `?` in `template` with the next bound slot.
    ///
    /// Missing or unbound slots leave the `?` in place. Does not modify the
    /// trace.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        let slots = self.slots.lock();
        let mut out = String::with_capacity(template.len() + slots.len() * 8);
        let mut next = slots.iter();
        for c in template.chars() {
            if c == '?' {
                match next.next() {
                    Some(Some(value)) => out.push_str(value),
                    _ => out.push('?'),
                }
            } else {
                out.push(c);
            }
        }
        out
    }
}
