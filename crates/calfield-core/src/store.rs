//! The 17-slot field array with set flags and modification stamps.
//!
//! A stamp records when a field was last written: [`UNSET`] for never,
//! [`COMPUTED`] for values filled in by field computation, and
//! [`MINIMUM_USER_STAMP`] or above for caller writes, increasing with
//! recency. The store owns no calendar logic.

use tracing::debug;

use crate::models::{Field, FieldMask};

pub const UNSET: i32 = 0;
pub const COMPUTED: i32 = 1;
pub const MINIMUM_USER_STAMP: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldStore {
    fields: [i32; Field::COUNT],
    is_set: [bool; Field::COUNT],
    stamp: [i32; Field::COUNT],
    next_stamp: i32,
    /// Fields are consistent with the time value.
    are_fields_set: bool,
    /// Every field, not just a subset, has been computed.
    are_all_fields_set: bool,
}

impl Default for FieldStore {
    fn default() -> Self {
        FieldStore {
            fields: [0; Field::COUNT],
            is_set: [false; Field::COUNT],
            stamp: [UNSET; Field::COUNT],
            next_stamp: MINIMUM_USER_STAMP,
            are_fields_set: false,
            are_all_fields_set: false,
        }
    }
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted values. Every set field is stamped
    /// as computed.
    pub(crate) fn restore(fields: [i32; Field::COUNT], is_set: [bool; Field::COUNT]) -> Self {
        let mut stamp = [UNSET; Field::COUNT];
        for (s, set) in stamp.iter_mut().zip(is_set) {
            if set {
                *s = COMPUTED;
            }
        }
        FieldStore {
            fields,
            is_set,
            stamp,
            next_stamp: MINIMUM_USER_STAMP,
            are_fields_set: false,
            are_all_fields_set: false,
        }
    }

    pub fn get(&self, field: Field) -> i32 {
        self.fields[field.index()]
    }

    pub fn values(&self) -> &[i32; Field::COUNT] {
        &self.fields
    }

    pub fn set_flags(&self) -> [bool; Field::COUNT] {
        self.is_set
    }

    pub fn stamps(&self) -> &[i32; Field::COUNT] {
        &self.stamp
    }

    pub fn stamp(&self, field: Field) -> i32 {
        self.stamp[field.index()]
    }

    /// Store a value without touching flags or stamps.
    pub fn set_internal(&mut self, field: Field, value: i32) {
        self.fields[field.index()] = value;
    }

    /// Record a caller write: value, set flag and the next stamp.
    pub fn set(&mut self, field: Field, value: i32) {
        let i = field.index();
        self.fields[i] = value;
        self.is_set[i] = true;
        self.stamp[i] = self.next_stamp;
        self.next_stamp += 1;
        self.are_fields_set = false;
        if self.next_stamp == i32::MAX {
            self.adjust_stamp();
        }
    }

    pub fn clear(&mut self, field: Field) {
        let i = field.index();
        self.fields[i] = 0;
        self.stamp[i] = UNSET;
        self.is_set[i] = false;
        self.set_unnormalized();
    }

    pub fn clear_all(&mut self) {
        self.fields = [0; Field::COUNT];
        self.stamp = [UNSET; Field::COUNT];
        self.is_set = [false; Field::COUNT];
        self.set_unnormalized();
    }

    pub fn is_set(&self, field: Field) -> bool {
        self.stamp[field.index()] != UNSET
    }

    /// True when the caller, not field computation, wrote the field.
    pub fn is_externally_set(&self, field: Field) -> bool {
        self.stamp[field.index()] >= MINIMUM_USER_STAMP
    }

    pub fn are_fields_set(&self) -> bool {
        self.are_fields_set
    }

    pub fn is_partially_normalized(&self) -> bool {
        self.are_fields_set && !self.are_all_fields_set
    }

    pub fn is_fully_normalized(&self) -> bool {
        self.are_fields_set && self.are_all_fields_set
    }

    pub fn set_unnormalized(&mut self) {
        self.are_fields_set = false;
        self.are_all_fields_set = false;
    }

    pub(crate) fn set_fully_normalized(&mut self) {
        self.are_fields_set = true;
        self.are_all_fields_set = true;
    }

    /// Fields whose stamp is not [`UNSET`].
    pub fn set_state_fields(&self) -> FieldMask {
        Field::ALL
            .into_iter()
            .filter(|f| self.stamp[f.index()] != UNSET)
            .fold(FieldMask::EMPTY, |mask, f| mask.with(f))
    }

    /// Mark the fields in `mask` as computed.
    pub fn set_fields_computed(&mut self, mask: FieldMask) {
        if mask == FieldMask::ALL {
            self.stamp = [COMPUTED; Field::COUNT];
            self.is_set = [true; Field::COUNT];
            self.set_fully_normalized();
            return;
        }
        for field in Field::ALL {
            let i = field.index();
            if mask.contains(field) {
                self.stamp[i] = COMPUTED;
                self.is_set[i] = true;
            } else if self.are_all_fields_set && !self.is_set[i] {
                self.are_all_fields_set = false;
            }
        }
        self.are_fields_set = true;
    }

    /// Mark one field as computed without changing normalization state.
    pub(crate) fn mark_computed(&mut self, field: Field) {
        let i = field.index();
        self.stamp[i] = COMPUTED;
        self.is_set[i] = true;
    }

    /// Keep only the fields in `mask`; everything else is zeroed and unset.
    /// The store is left partially normalized.
    pub fn set_fields_normalized(&mut self, mask: FieldMask) {
        if mask != FieldMask::ALL {
            for field in Field::ALL {
                if !mask.contains(field) {
                    let i = field.index();
                    self.stamp[i] = UNSET;
                    self.fields[i] = 0;
                    self.is_set[i] = false;
                }
            }
        }
        self.are_fields_set = true;
        self.are_all_fields_set = false;
    }

    /// Overwrite the whole value array, used to roll back a failed strict
    /// recomputation.
    pub(crate) fn restore_values(&mut self, values: [i32; Field::COUNT]) {
        self.fields = values;
    }

    /// Renumber caller stamps to the dense range starting at
    /// [`MINIMUM_USER_STAMP`], preserving their relative order.
    fn adjust_stamp(&mut self) {
        let mut user: Vec<i32> = self
            .stamp
            .iter()
            .copied()
            .filter(|s| *s >= MINIMUM_USER_STAMP)
            .collect();
        user.sort_unstable();
        user.dedup();
        for s in self.stamp.iter_mut() {
            if let Ok(rank) = user.binary_search(s) {
                *s = MINIMUM_USER_STAMP + rank as i32;
            }
        }
        self.next_stamp = MINIMUM_USER_STAMP + user.len() as i32;
        debug!(next_stamp = self.next_stamp, "compacted field stamps");
    }

    #[cfg(test)]
    pub(crate) fn force_next_stamp(&mut self, next: i32) {
        self.next_stamp = next;
    }
}
