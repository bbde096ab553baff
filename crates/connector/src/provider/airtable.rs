// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{ConnectProvider, Provider};

pub struct Airtable;

impl ConnectProvider for Airtable {
    fn provider(&self) -> Provider {
        Provider::Airtable
    }

    fn description(&self) -> &'static str {
        "Connect your Airtable workspace to sync databases, tables, and manage your data seamlessly."
    }

    fn account_noun(&self) -> &'static str {
        "workspace"
    }
}
