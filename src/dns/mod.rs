// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod cache;
pub mod resolver;
pub mod wildcard;

pub use cache::{DnsCache, DnsCacheStats};
pub use resolver::ResolverPool;
pub use wildcard::WildcardDetector;
