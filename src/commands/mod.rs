// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod assets;
pub mod categories;
pub mod prices;
pub mod recurring;
pub mod statements;
pub mod transactions;
pub mod transfers;
