// Copyright (c) 2026 Paradux Project. MIT License.
// See LICENSE for details.

//! # Paradux — Core Engine
//!
//! Paradux is a disaster-recovery tool: it keeps a small set of secrets
//! (an "everyday" passphrase and, behind it, a Shamir-split recovery
//! secret) inside a LUKS-style encrypted container, and hands each of a
//! configured quorum of trusted stewards one share of that recovery
//! secret. Losing the everyday passphrase is recoverable as long as
//! enough stewards come forward; losing fewer than the quorum leaks
//! nothing.
//!
//! ## Architecture
//!
//! - **shamir** — field arithmetic and split/reconstruct over
//!   arbitrary-precision Mersenne-prime fields.
//! - **store** — typed, editable JSON config files (`user`, `stewards`,
//!   `datasets`, `metadata_locations`) sharing one edit/validate/promote/
//!   abort state machine, plus the non-editable `secrets` ledger.
//! - **container** — the LUKS image lifecycle: create, mount, recover,
//!   export metadata.
//! - **packager** — renders the bundle handed to each steward.
//! - **recovery** — turns a quorum of steward packages back into a
//!   recovery secret and installs a new everyday passphrase.
//! - **transfer** — scheme-dispatched upload backends for publishing
//!   metadata to steward-visible locations.
//! - **ports** — trait seams for the external collaborators (editor,
//!   encryption subprocess, upload backends) this crate depends on but
//!   does not implement; `paradux-cli` supplies the real ones.
//!
//! Every fallible operation returns [`error::ParaduxResult`].

pub mod container;
pub mod error;
pub mod packager;
pub mod paths;
pub mod ports;
pub mod recovery;
pub mod shamir;
pub mod store;
pub mod timestamp;
pub mod transfer;
