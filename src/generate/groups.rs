/// Captured substrings, indexed by 1-based group number.
///
/// Entries start unset; a reference to an unset group resolves to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    slots: Vec<Option<String>>,
}

impl GroupTable {
    pub fn with_groups(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Stores the text a group produced when its evaluation completed.
    pub fn set(
        &mut self,
        index: usize,
        text: String,
    ) {
        if index == 0 {
            return;
        }
        if self.slots.len() < index {
            self.slots.resize(index, None);
        }
        self.slots[index - 1] = Some(text);
    }

    pub fn resolve(
        &self,
        index: usize,
    ) -> &str {
        index
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .and_then(|slot| slot.as_deref())
            .unwrap_or("")
    }
}
