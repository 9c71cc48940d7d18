// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! Typed repositories over the JSON document store.

pub mod accounts;
pub mod transactions;
pub mod users;

pub use accounts::{Account, AccountKind, AccountRepository};
pub use transactions::{TransferKind, TransferRecord, TransferRepository, TransferStage};
pub use users::{User, UserRepository};
