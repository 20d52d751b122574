// Copyright (C) 2025 Marceline Cramer
// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Paraglut is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option) any
// later version.
//
// Paraglut is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for
// more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with Paraglut. If not, see <https://www.gnu.org/licenses/>.

/// A positive identifier of an encoding variable.
pub type Ident = u32;

/// Hands out globally unique identifiers for one encoding run.
///
/// Atoms, Tseitin auxiliaries, and inconsistency indicators all draw from the
/// same allocator, so no two of them ever share an identifier. The allocator
/// is owned by a single encoding and passed explicitly into every transform
/// that needs fresh variables.
#[derive(Clone, Debug, Default)]
pub struct IdentifierAllocator {
    last: Ident,
}

impl IdentifierAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next unused identifier, starting at 1.
    pub fn fresh(&mut self) -> Ident {
        self.last += 1;
        self.last
    }

    /// The number of identifiers allocated so far, which is also the largest.
    pub fn len(&self) -> u32 {
        self.last
    }

    pub fn is_empty(&self) -> bool {
        self.last == 0
    }
}
