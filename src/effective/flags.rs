// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::argument::Status;

use core::fmt;

use serde::Serialize;

/// Compact summary of the common properties of an effective statement.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EffectiveFlags(u16);

impl EffectiveFlags {
    const STATUS_DEPRECATED: u16 = 1 << 0;
    const STATUS_OBSOLETE: u16 = 1 << 1;
    const CONFIG_DEFINED: u16 = 1 << 2;
    const CONFIG_TRUE: u16 = 1 << 3;
    const MANDATORY: u16 = 1 << 4;
    const USER_ORDERED: u16 = 1 << 5;
    const PRESENCE: u16 = 1 << 6;
    const ADDED_BY_USES: u16 = 1 << 7;
    const AUGMENTING: u16 = 1 << 8;
    const ADDED_BY_DEVIATION: u16 = 1 << 9;

    pub fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, bit: u16, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    fn get(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn status(&self) -> Status {
        if self.get(Self::STATUS_OBSOLETE) {
            Status::Obsolete
        } else if self.get(Self::STATUS_DEPRECATED) {
            Status::Deprecated
        } else {
            Status::Current
        }
    }

    pub fn set_status(&mut self, status: Status) {
        self.set(Self::STATUS_DEPRECATED, status == Status::Deprecated);
        self.set(Self::STATUS_OBSOLETE, status == Status::Obsolete);
    }

    /// `None` where config has no meaning, such as inside groupings,
    /// operations and notifications.
    pub fn config(&self) -> Option<bool> {
        self.get(Self::CONFIG_DEFINED)
            .then(|| self.get(Self::CONFIG_TRUE))
    }

    pub fn set_config(&mut self, config: Option<bool>) {
        self.set(Self::CONFIG_DEFINED, config.is_some());
        self.set(Self::CONFIG_TRUE, config == Some(true));
    }

    pub fn is_mandatory(&self) -> bool {
        self.get(Self::MANDATORY)
    }

    pub fn set_mandatory(&mut self, value: bool) {
        self.set(Self::MANDATORY, value);
    }

    pub fn is_user_ordered(&self) -> bool {
        self.get(Self::USER_ORDERED)
    }

    pub fn set_user_ordered(&mut self, value: bool) {
        self.set(Self::USER_ORDERED, value);
    }

    pub fn is_presence(&self) -> bool {
        self.get(Self::PRESENCE)
    }

    pub fn set_presence(&mut self, value: bool) {
        self.set(Self::PRESENCE, value);
    }

    pub fn is_added_by_uses(&self) -> bool {
        self.get(Self::ADDED_BY_USES)
    }

    pub fn set_added_by_uses(&mut self, value: bool) {
        self.set(Self::ADDED_BY_USES, value);
    }

    pub fn is_augmenting(&self) -> bool {
        self.get(Self::AUGMENTING)
    }

    pub fn set_augmenting(&mut self, value: bool) {
        self.set(Self::AUGMENTING, value);
    }

    pub fn is_added_by_deviation(&self) -> bool {
        self.get(Self::ADDED_BY_DEVIATION)
    }

    pub fn set_added_by_deviation(&mut self, value: bool) {
        self.set(Self::ADDED_BY_DEVIATION, value);
    }
}

impl fmt::Debug for EffectiveFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveFlags")
            .field("status", &self.status())
            .field("config", &self.config())
            .field("mandatory", &self.is_mandatory())
            .field("user_ordered", &self.is_user_ordered())
            .field("presence", &self.is_presence())
            .field("added_by_uses", &self.is_added_by_uses())
            .field("augmenting", &self.is_augmenting())
            .field("added_by_deviation", &self.is_added_by_deviation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_is_tri_state() {
        let mut flags = EffectiveFlags::new();
        assert_eq!(flags.config(), None);
        flags.set_config(Some(false));
        assert_eq!(flags.config(), Some(false));
        flags.set_config(Some(true));
        assert_eq!(flags.config(), Some(true));
        flags.set_config(None);
        assert_eq!(flags.config(), None);
        assert_eq!(flags.bits(), 0);
    }

    #[test]
    fn status_bits_are_exclusive() {
        let mut flags = EffectiveFlags::new();
        flags.set_status(Status::Obsolete);
        assert_eq!(flags.status(), Status::Obsolete);
        flags.set_status(Status::Deprecated);
        assert_eq!(flags.status(), Status::Deprecated);
        flags.set_status(Status::Current);
        assert_eq!(flags.status(), Status::Current);
    }
}
