//! Shared utilities and common types for the HabitDesk backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (token digests, invite code generation)
//! - Password hashing with Argon2id
//! - JWT tokens carrying role claims
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod password;
pub mod validation;
