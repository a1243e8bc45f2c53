//! Commandable point — a 16-level priority ladder resolving to a present value.
//!
//! Writers command the point at a priority between 1 (highest) and 16
//! (lowest). The present value is the value at the lowest-numbered occupied
//! slot, falling back to the relinquish default when every slot is empty.
//! Priority 6 is reserved and never writable.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ValidationError};
use crate::value::{PointValue, ValueKind, WriteValue};

/// Number of slots in the priority ladder.
pub const PRIORITY_LEVELS: usize = 16;

/// Priority reserved for minimum on/off; never writable.
pub const RESERVED_PRIORITY: u8 = 6;

/// Resolution result of a successful write or relinquish.
///
/// `actuate` is false while the point is out of service; the caller must
/// then skip the physical effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub old: PointValue,
    pub new: PointValue,
    pub actuate: bool,
}

/// Priority ladder plus change detection for one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandablePoint {
    slots: [Option<PointValue>; PRIORITY_LEVELS],
    relinquish_default: PointValue,
    number_of_states: Option<u32>,
    out_of_service: bool,
    cached_value: PointValue,
    changed: bool,
}

impl CommandablePoint {
    /// A binary or multi-state point with every slot relinquished.
    ///
    /// `number_of_states` bounds multi-state values and must be `None` for
    /// binary points.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the default does not fit the kind or
    /// range.
    pub fn new(
        relinquish_default: PointValue,
        number_of_states: Option<u32>,
    ) -> Result<Self, ValidationError> {
        match (relinquish_default, number_of_states) {
            (PointValue::Binary(_), None) => {}
            (PointValue::MultiState(_), Some(0)) => return Err(ValidationError::NoStates),
            (PointValue::MultiState(value), Some(max)) if value == 0 || value > max => {
                return Err(ValidationError::StateOutOfRange { value, max });
            }
            (PointValue::MultiState(_), Some(_)) => {}
            _ => return Err(ValidationError::ValueKindMismatch),
        }
        Ok(Self {
            slots: [None; PRIORITY_LEVELS],
            relinquish_default,
            number_of_states,
            out_of_service: false,
            cached_value: relinquish_default,
            changed: false,
        })
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.relinquish_default.kind()
    }

    /// The value of the lowest-numbered occupied slot, else the relinquish default.
    #[must_use]
    pub fn resolve(&self) -> PointValue {
        self.slots
            .iter()
            .find_map(|slot| *slot)
            .unwrap_or(self.relinquish_default)
    }

    /// Priority (1-based) currently in control, `None` when relinquished to default.
    #[must_use]
    pub fn active_priority(&self) -> Option<u8> {
        self.slots
            .iter()
            .position(Option::is_some)
            .and_then(|idx| u8::try_from(idx + 1).ok())
    }

    /// Value stored at `priority`, `None` when relinquished or out of range.
    #[must_use]
    pub fn slot(&self, priority: u8) -> Option<PointValue> {
        slot_index(priority).and_then(|idx| self.slots[idx])
    }

    #[must_use]
    pub fn priority_array(&self) -> &[Option<PointValue>; PRIORITY_LEVELS] {
        &self.slots
    }

    #[must_use]
    pub fn relinquish_default(&self) -> PointValue {
        self.relinquish_default
    }

    #[must_use]
    pub fn number_of_states(&self) -> Option<u32> {
        self.number_of_states
    }

    /// Command `value` at `priority`. A `Null` value relinquishes.
    ///
    /// # Errors
    ///
    /// - `WRITE_ACCESS_DENIED` for priority 6
    /// - `VALUE_OUT_OF_RANGE` for a priority outside 1..=16 or a multi-state
    ///   value outside `1..=number_of_states`
    /// - `INVALID_DATA_TYPE` when the value kind does not match the point
    pub fn write(&mut self, priority: u8, value: WriteValue) -> Result<Command, ProtocolError> {
        let idx = checked_priority(priority)?;
        let value = match value {
            WriteValue::Null => None,
            WriteValue::Value(value) => Some(self.check_value(value)?),
        };
        Ok(self.apply(|slots| slots[idx] = value))
    }

    /// Mark the slot at `priority` unoccupied.
    ///
    /// # Errors
    ///
    /// Same priority validation as [`write`](Self::write).
    pub fn relinquish(&mut self, priority: u8) -> Result<Command, ProtocolError> {
        self.write(priority, WriteValue::Null)
    }

    /// Replace the relinquish default.
    ///
    /// # Errors
    ///
    /// `INVALID_DATA_TYPE` or `VALUE_OUT_OF_RANGE` as for a priority write.
    pub fn set_relinquish_default(&mut self, value: PointValue) -> Result<Command, ProtocolError> {
        let value = self.check_value(value)?;
        let old = self.resolve();
        self.relinquish_default = value;
        Ok(self.finish(old))
    }

    #[must_use]
    pub fn out_of_service(&self) -> bool {
        self.out_of_service
    }

    /// Set the out-of-service flag; only an actual flip raises `changed`.
    pub fn set_out_of_service(&mut self, value: bool) {
        if self.out_of_service != value {
            self.out_of_service = value;
            self.changed = true;
        }
    }

    /// Whether a change is pending since the last [`take_changed`](Self::take_changed).
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Return and clear the pending change flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn check_value(&self, value: PointValue) -> Result<PointValue, ProtocolError> {
        match (value, self.number_of_states) {
            (PointValue::Binary(_), None) => Ok(value),
            (PointValue::MultiState(state), Some(max)) => {
                if state == 0 || state > max {
                    Err(ProtocolError::value_out_of_range())
                } else {
                    Ok(value)
                }
            }
            _ => Err(ProtocolError::invalid_data_type()),
        }
    }

    fn apply(
        &mut self,
        mutate: impl FnOnce(&mut [Option<PointValue>; PRIORITY_LEVELS]),
    ) -> Command {
        let old = self.resolve();
        mutate(&mut self.slots);
        self.finish(old)
    }

    fn finish(&mut self, old: PointValue) -> Command {
        let new = self.resolve();
        if new != self.cached_value {
            self.cached_value = new;
            self.changed = true;
        }
        Command {
            old,
            new,
            actuate: !self.out_of_service,
        }
    }
}

fn slot_index(priority: u8) -> Option<usize> {
    let idx = usize::from(priority).checked_sub(1)?;
    (idx < PRIORITY_LEVELS).then_some(idx)
}

fn checked_priority(priority: u8) -> Result<usize, ProtocolError> {
    let idx = slot_index(priority).ok_or_else(ProtocolError::value_out_of_range)?;
    if priority == RESERVED_PRIORITY {
        return Err(ProtocolError::write_access_denied());
    }
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::value::BinaryPv;

    fn binary() -> CommandablePoint {
        CommandablePoint::new(PointValue::Binary(BinaryPv::Inactive), None).unwrap()
    }

    fn active() -> WriteValue {
        WriteValue::Value(PointValue::Binary(BinaryPv::Active))
    }

    #[test]
    fn should_resolve_to_relinquish_default_when_all_slots_empty() {
        let point = binary();
        assert_eq!(point.resolve(), PointValue::Binary(BinaryPv::Inactive));
        assert_eq!(point.active_priority(), None);
    }

    #[test]
    fn should_resolve_to_lowest_numbered_occupied_slot() {
        let mut point = CommandablePoint::new(PointValue::MultiState(1), Some(5)).unwrap();
        point.write(10, PointValue::MultiState(2).into()).unwrap();
        point.write(8, PointValue::MultiState(3).into()).unwrap();
        point.write(16, PointValue::MultiState(4).into()).unwrap();
        assert_eq!(point.resolve(), PointValue::MultiState(3));
        assert_eq!(point.active_priority(), Some(8));

        point.relinquish(8).unwrap();
        assert_eq!(point.resolve(), PointValue::MultiState(2));
        point.relinquish(10).unwrap();
        point.relinquish(16).unwrap();
        assert_eq!(point.resolve(), PointValue::MultiState(1));
    }

    #[test]
    fn should_match_lowest_slot_for_every_single_priority() {
        for priority in (1..=16u8).filter(|p| *p != RESERVED_PRIORITY) {
            let mut point = binary();
            for lower in (priority + 1..=16).filter(|p| *p != RESERVED_PRIORITY) {
                point
                    .write(lower, WriteValue::Value(PointValue::Binary(BinaryPv::Inactive)))
                    .unwrap();
            }
            point.write(priority, active()).unwrap();
            assert_eq!(
                point.resolve(),
                PointValue::Binary(BinaryPv::Active),
                "priority {priority}"
            );
            assert_eq!(point.active_priority(), Some(priority));
        }
    }

    #[test]
    fn should_deny_write_and_relinquish_at_priority_six() {
        let mut point = binary();
        let err = point.write(6, active()).unwrap_err();
        assert_eq!(err.code, ErrorCode::WriteAccessDenied);
        let err = point.write(6, WriteValue::Null).unwrap_err();
        assert_eq!(err.code, ErrorCode::WriteAccessDenied);
        let err = point.relinquish(6).unwrap_err();
        assert_eq!(err.code, ErrorCode::WriteAccessDenied);
        assert!(point.slot(6).is_none());
    }

    #[test]
    fn should_reject_out_of_range_priority() {
        let mut point = binary();
        assert_eq!(point.write(0, active()).unwrap_err().code, ErrorCode::ValueOutOfRange);
        assert_eq!(point.write(17, active()).unwrap_err().code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn should_reject_value_of_wrong_kind() {
        let mut point = binary();
        let err = point.write(8, PointValue::MultiState(1).into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDataType);
    }

    #[test]
    fn should_reject_multi_state_value_outside_number_of_states() {
        let mut point = CommandablePoint::new(PointValue::MultiState(1), Some(3)).unwrap();
        assert_eq!(
            point.write(8, PointValue::MultiState(4).into()).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
        assert_eq!(
            point.write(8, PointValue::MultiState(0).into()).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
    }

    #[test]
    fn should_flag_change_only_when_resolved_value_differs() {
        let mut point = binary();
        point.write(8, WriteValue::Value(PointValue::Binary(BinaryPv::Inactive))).unwrap();
        assert!(!point.is_changed());

        let cmd = point.write(8, active()).unwrap();
        assert_eq!(cmd.old, PointValue::Binary(BinaryPv::Inactive));
        assert_eq!(cmd.new, PointValue::Binary(BinaryPv::Active));
        assert!(point.take_changed());
        assert!(!point.is_changed());

        point.write(9, WriteValue::Value(PointValue::Binary(BinaryPv::Inactive))).unwrap();
        assert!(!point.is_changed());
    }

    #[test]
    fn should_raise_change_once_when_out_of_service_set_twice() {
        let mut point = binary();
        point.set_out_of_service(true);
        assert!(point.take_changed());
        point.set_out_of_service(true);
        assert!(!point.take_changed());
        point.set_out_of_service(false);
        assert!(point.take_changed());
    }

    #[test]
    fn should_not_actuate_while_out_of_service() {
        let mut point = binary();
        point.set_out_of_service(true);
        let cmd = point.write(8, active()).unwrap();
        assert!(!cmd.actuate);
        assert_eq!(point.resolve(), PointValue::Binary(BinaryPv::Active));
        assert!(point.is_changed());
    }

    #[test]
    fn should_resolve_new_relinquish_default() {
        let mut point = binary();
        let cmd = point
            .set_relinquish_default(PointValue::Binary(BinaryPv::Active))
            .unwrap();
        assert_eq!(cmd.new, PointValue::Binary(BinaryPv::Active));
        assert!(point.is_changed());
    }

    #[test]
    fn should_reject_default_outside_number_of_states() {
        let result = CommandablePoint::new(PointValue::MultiState(4), Some(3));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::StateOutOfRange { value: 4, max: 3 }
        );
        assert_eq!(
            CommandablePoint::new(PointValue::MultiState(1), None).unwrap_err(),
            ValidationError::ValueKindMismatch
        );
    }
}
