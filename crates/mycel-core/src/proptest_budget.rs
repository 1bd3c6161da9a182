//! Property-based tests for the budget clamps.

use mycel_api::{AuthResponse, ClientPolicy, Options};
use mycel_config::BudgetLimits;
use mycel_util::ClientId;
use proptest::prelude::*;

use super::budget::{allot, Grant};

/// Minutes a server or terminal might plausibly report in a day
fn minutes() -> impl Strategy<Value = i64> {
    0i64..24 * 60
}

fn policy(time_limit: i64) -> ClientPolicy {
    ClientPolicy {
        id: ClientId::new(1),
        name: "Test".into(),
        screen_resolution: None,
        short_time: false,
        options: Options {
            time_limit: Some(time_limit),
            ..Default::default()
        },
        printers: Vec::new(),
    }
}

fn patron(minutes: i64, guest: bool) -> AuthResponse {
    AuthResponse {
        age: 30,
        authenticated: true,
        message: String::new(),
        minutes,
        account_type: if guest { "G" } else { "V" }.into(),
    }
}

fn limits(baseline_minutes: i64) -> BudgetLimits {
    BudgetLimits {
        baseline_minutes,
        ..Default::default()
    }
}

proptest! {
    /// Property: A session never outlasts closing time, and a clamped
    /// session ends exactly at it.
    #[test]
    fn prop_closing_clamp(
        quota in minutes(),
        limit in minutes(),
        baseline in 0i64..240,
        until_close in -60i64..24 * 60,
        guest in any::<bool>(),
    ) {
        let p = policy(limit);
        let auth = patron(quota, guest);
        let limits = limits(baseline);

        let unclamped = allot(&p, Grant::Patron(&auth), &limits, i64::MAX);
        let clamped = allot(&p, Grant::Patron(&auth), &limits, until_close);

        prop_assert!(clamped.total() <= until_close);
        prop_assert_eq!(clamped.granted, quota);
        if unclamped.total() > until_close {
            prop_assert_eq!(clamped.total(), until_close);
        } else {
            prop_assert_eq!(clamped, unclamped);
        }
    }

    /// Property: Away from closing time a guest gets the smaller of their
    /// quota and the terminal limit.
    #[test]
    fn prop_guest_clamp(
        quota in minutes(),
        limit in minutes(),
        baseline in 0i64..240,
    ) {
        let auth = patron(quota, true);
        let a = allot(&policy(limit), Grant::Patron(&auth), &limits(baseline), 48 * 60);

        prop_assert_eq!(a.total(), quota.min(limit));
        prop_assert_eq!(a.granted, quota);
    }

    /// Property: Away from closing time a non-guest's extra is the terminal
    /// limit minus the baseline.
    #[test]
    fn prop_member_extra(
        quota in minutes(),
        limit in minutes(),
        baseline in 0i64..240,
        slack in 0i64..120,
    ) {
        let auth = patron(quota, false);
        let until_close = quota + limit - baseline + slack;
        let a = allot(&policy(limit), Grant::Patron(&auth), &limits(baseline), until_close);

        prop_assert_eq!(a.extra, limit - baseline);
        prop_assert_eq!(a.total(), quota + limit - baseline);
    }
}
