//! Shared test harness modules for the mapclean CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;
use crate::process::{
    ProcessArgs, ProcessConfig, ProcessOutcome, execute_process, resolve_process_config,
};

mod helpers;
