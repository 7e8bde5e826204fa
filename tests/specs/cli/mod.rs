// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
mod help;
mod init;
mod purge;
mod queue;
mod state;
mod sync;
