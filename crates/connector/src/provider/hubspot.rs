// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{ConnectProvider, Provider};

pub struct HubSpot;

impl ConnectProvider for HubSpot {
    fn provider(&self) -> Provider {
        Provider::HubSpot
    }

    fn description(&self) -> &'static str {
        "Connect your HubSpot account to sync your contacts, companies, and deals."
    }

    fn account_noun(&self) -> &'static str {
        "account"
    }
}
