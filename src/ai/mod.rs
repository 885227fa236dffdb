// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod client;
pub mod engine;
pub mod prompts;
pub mod source;

pub use client::AiClient;
pub use engine::AiEngine;
pub use source::AiSource;
