//! Null-preserving cross expansion of a document's two nested arrays
//!
//! Equivalent to unwinding `devices` and then `authenticators` with empty
//! arrays preserved: an absent or empty side contributes a single `None`
//! placeholder, so the other side still expands and no document is
//! dropped.
//!
//! Rows are device-major: for each device (source order) every
//! authenticator (source order).

use crate::document::{AuthenticatorRecord, DeviceRecord, UserDocument};

/// One expanded (device, authenticator) pairing
pub type ExpandedPair<'a> = (Option<&'a DeviceRecord>, Option<&'a AuthenticatorRecord>);

/// Iterator over the Cartesian product of two optional sequences
#[derive(Debug, Clone)]
pub struct CrossProduct<'a> {
    devices: &'a [DeviceRecord],
    authenticators: &'a [AuthenticatorRecord],
    outer: usize,
    inner: usize,
}

impl<'a> CrossProduct<'a> {
    pub fn new(devices: &'a [DeviceRecord], authenticators: &'a [AuthenticatorRecord]) -> Self {
        CrossProduct {
            devices,
            authenticators,
            outer: 0,
            inner: 0,
        }
    }

    // Empty sides count as one placeholder slot
    fn outer_len(&self) -> usize {
        self.devices.len().max(1)
    }

    fn inner_len(&self) -> usize {
        self.authenticators.len().max(1)
    }
}

impl<'a> Iterator for CrossProduct<'a> {
    type Item = ExpandedPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.outer >= self.outer_len() {
            return None;
        }

        let pair = (self.devices.get(self.outer), self.authenticators.get(self.inner));

        self.inner += 1;
        if self.inner >= self.inner_len() {
            self.inner = 0;
            self.outer += 1;
        }

        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.outer_len() * self.inner_len();
        let done = self.outer * self.inner_len() + self.inner;
        let remaining = total.saturating_sub(done);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CrossProduct<'_> {}

/// Expand a document into its (device, authenticator) pairs
pub fn expand(doc: &UserDocument) -> CrossProduct<'_> {
    CrossProduct::new(doc.devices(), doc.authenticators())
}
