// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{ConnectProvider, Provider};

pub struct Notion;

impl ConnectProvider for Notion {
    fn provider(&self) -> Provider {
        Provider::Notion
    }

    fn description(&self) -> &'static str {
        "Connect your Notion workspace to sync pages, databases, and collaborate seamlessly."
    }

    fn account_noun(&self) -> &'static str {
        "workspace"
    }
}
