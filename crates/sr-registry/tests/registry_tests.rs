//! Subscription Registry Integration Tests
//!
//! Drives the registry through its public surface with explicit principals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sr_registry::{
    Address, ExecutionContext, ProvisioningError, RegistryError, RegistryNotification,
    RegistryService, SubscriptionFactory, SubscriptionHandle, TsidSubscriptionFactory,
    DEFAULT_NOTIFICATION_CAPACITY,
};

const ANALYST: &str = "0xA11CE";
const SUBSCRIBER1: &str = "0x5B01";
const SUBSCRIBER2: &str = "0x5B02";

fn as_principal(address: &str) -> ExecutionContext {
    ExecutionContext::create(address)
}

fn addr(address: &str) -> Address {
    Address::new(address)
}

mod subscribe_tests {
    use super::*;

    #[test]
    fn test_subscribe() {
        let service = RegistryService::with_defaults();
        let mut notifications = service.notifications();

        let event = service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();

        assert_eq!(event.requester, addr(SUBSCRIBER1));
        assert_eq!(event.subscriber, addr(SUBSCRIBER1));
        assert_eq!(event.analyst, addr(ANALYST));
        assert_eq!(event.calls, 5);

        match notifications.try_recv().unwrap() {
            RegistryNotification::Subscribed(published) => assert_eq!(published, event),
            other => panic!("Expected Subscribed, got {:?}", other),
        }
        assert!(notifications.try_recv().is_err());

        assert_eq!(service.registry().count_subscriptions(&as_principal(ANALYST)), 1);
    }

    #[test]
    fn test_self_subscription_rejected() {
        let service = RegistryService::with_defaults();
        let mut notifications = service.notifications();

        let err = service.subscribe(&as_principal(ANALYST), ANALYST, 5).unwrap_err();

        assert_eq!(err.code(), "SELF_SUBSCRIPTION");
        assert!(notifications.try_recv().is_err());
        assert_eq!(service.registry().snapshot().analyst_count(), 0);
    }

    #[test]
    fn test_zero_calls_rejected() {
        let service = RegistryService::with_defaults();

        let err = service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 0).unwrap_err();

        assert_eq!(err.code(), "INVALID_CALL_BUDGET");
        assert_eq!(service.registry().count_subscriptions(&as_principal(ANALYST)), 0);
        // a rejected first subscribe must not create the analyst record
        assert!(service.registry().snapshot().record(&addr(ANALYST)).is_none());
    }

    #[test]
    fn test_negative_calls_rejected() {
        let service = RegistryService::with_defaults();
        let err = service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, -1).unwrap_err();
        assert_eq!(err.code(), "INVALID_CALL_BUDGET");
    }

    #[test]
    fn test_resubscribe_while_active_rejected() {
        let service = RegistryService::with_defaults();
        let subscriber = as_principal(SUBSCRIBER1);
        service.subscribe(&subscriber, ANALYST, 5).unwrap();
        let before = service.registry().snapshot();
        let audited = service.audit_log().len();
        let mut notifications = service.notifications();

        let err = service.subscribe(&subscriber, ANALYST, 9).unwrap_err();

        assert_eq!(err.code(), "ALREADY_SUBSCRIBED");
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(service.registry().snapshot(), before);
        assert!(notifications.try_recv().is_err());
        assert_eq!(service.audit_log().len(), audited);
    }

    #[test]
    fn test_resubscribe_after_unsubscribe() {
        let service = RegistryService::with_defaults();
        let subscriber = as_principal(SUBSCRIBER1);

        let first = service.subscribe(&subscriber, ANALYST, 5).unwrap();
        service.unsubscribe(&subscriber, ANALYST).unwrap();
        let second = service.subscribe(&subscriber, ANALYST, 3).unwrap();

        assert_ne!(first.subscription, second.subscription);
        let analyst = as_principal(ANALYST);
        assert_eq!(
            service.registry().get_subscription_record(&analyst, &addr(SUBSCRIBER1)).unwrap().calls,
            3
        );
    }
}

mod count_tests {
    use super::*;

    #[test]
    fn test_count_subscriptions() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        service.subscribe(&as_principal(SUBSCRIBER2), ANALYST, 3).unwrap();

        assert_eq!(service.registry().count_subscriptions(&as_principal(ANALYST)), 2);
        assert_eq!(
            service.registry().list_subscribers(&as_principal(ANALYST)),
            vec![addr(SUBSCRIBER1), addr(SUBSCRIBER2)]
        );
    }

    #[test]
    fn test_count_without_analyst_record_is_zero() {
        let service = RegistryService::with_defaults();
        assert_eq!(service.registry().count_subscriptions(&as_principal(ANALYST)), 0);
        assert!(service.registry().list_subscribers(&as_principal(ANALYST)).is_empty());
    }

    #[test]
    fn test_count_is_per_analyst() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();

        // the subscriber has no analyst record of its own
        assert_eq!(service.registry().count_subscriptions(&as_principal(SUBSCRIBER1)), 0);
    }
}

mod index_tests {
    use super::*;

    #[test]
    fn test_get_subscriber_by_index() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        let event = service.subscribe(&as_principal(SUBSCRIBER2), ANALYST, 3).unwrap();

        let subscriber = service
            .registry()
            .get_subscriber_by_index(&as_principal(ANALYST), 1)
            .unwrap();

        assert_eq!(subscriber, event.subscriber);
        assert_eq!(subscriber, addr(SUBSCRIBER2));
    }

    #[test]
    fn test_get_subscriber_by_index_without_analyst_record() {
        let service = RegistryService::with_defaults();
        let err = service
            .registry()
            .get_subscriber_by_index(&as_principal(ANALYST), 1)
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAnalyst { .. }));
    }

    #[test]
    fn test_get_subscriber_by_unknown_index() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();

        let err = service
            .registry()
            .get_subscriber_by_index(&as_principal(ANALYST), 1)
            .unwrap_err();
        assert_eq!(err, RegistryError::IndexOutOfRange { index: 1, count: 1 });
    }

    #[test]
    fn test_get_subscriber_by_negative_index() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();

        let err = service
            .registry()
            .get_subscriber_by_index(&as_principal(ANALYST), -1)
            .unwrap_err();
        assert_eq!(err, RegistryError::IndexOutOfRange { index: -1, count: 1 });
    }

    #[test]
    fn test_get_subscription_by_index() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        let event = service.subscribe(&as_principal(SUBSCRIBER2), ANALYST, 3).unwrap();

        let handle = service
            .registry()
            .get_subscription_by_index(&as_principal(ANALYST), 1)
            .unwrap();
        assert_eq!(handle, event.subscription);
    }

    #[test]
    fn test_get_subscription_by_index_failures() {
        let service = RegistryService::with_defaults();
        let analyst = as_principal(ANALYST);

        assert!(matches!(
            service.registry().get_subscription_by_index(&analyst, 1).unwrap_err(),
            RegistryError::UnknownAnalyst { .. }
        ));

        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        assert!(matches!(
            service.registry().get_subscription_by_index(&analyst, 1).unwrap_err(),
            RegistryError::IndexOutOfRange { .. }
        ));
        assert!(matches!(
            service.registry().get_subscription_by_index(&analyst, -1).unwrap_err(),
            RegistryError::IndexOutOfRange { .. }
        ));
    }

    #[test]
    fn test_indices_shift_after_unsubscribe() {
        let service = RegistryService::with_defaults();
        let analyst = as_principal(ANALYST);
        for s in [SUBSCRIBER1, SUBSCRIBER2, "0x5B03"] {
            service.subscribe(&as_principal(s), ANALYST, 1).unwrap();
        }

        service.unsubscribe(&as_principal(SUBSCRIBER1), ANALYST).unwrap();

        // last subscriber moved into the vacated slot
        assert_eq!(
            service.registry().get_subscriber_by_index(&analyst, 0).unwrap(),
            addr("0x5B03")
        );
        assert_eq!(
            service.registry().get_subscriber_by_index(&analyst, 1).unwrap(),
            addr(SUBSCRIBER2)
        );
        assert!(service.registry().get_subscriber_by_index(&analyst, 2).is_err());
    }
}

mod address_tests {
    use super::*;

    #[test]
    fn test_get_subscription_by_address() {
        let service = RegistryService::with_defaults();
        let event = service.subscribe(&as_principal(SUBSCRIBER2), ANALYST, 3).unwrap();

        let handle = service
            .registry()
            .get_subscription_by_address(&as_principal(ANALYST), &addr(SUBSCRIBER2))
            .unwrap();
        assert_eq!(handle, event.subscription);
    }

    #[test]
    fn test_get_subscription_by_address_without_analyst_record() {
        let service = RegistryService::with_defaults();
        let err = service
            .registry()
            .get_subscription_by_address(&as_principal(ANALYST), &addr(SUBSCRIBER2))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAnalyst { .. }));
    }

    #[test]
    fn test_get_subscription_by_unknown_address() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();

        let err = service
            .registry()
            .get_subscription_by_address(&as_principal(ANALYST), &addr(SUBSCRIBER2))
            .unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_SUBSCRIBER");
    }

    #[test]
    fn test_get_subscription_from_address() {
        let service = RegistryService::with_defaults();
        let event = service.subscribe(&as_principal(SUBSCRIBER2), ANALYST, 3).unwrap();

        let handle = service
            .registry()
            .get_subscription_from_address(&as_principal(SUBSCRIBER2), &addr(ANALYST))
            .unwrap();
        assert_eq!(handle, event.subscription);
    }

    #[test]
    fn test_get_subscription_from_address_without_analyst_record() {
        let service = RegistryService::with_defaults();
        let err = service
            .registry()
            .get_subscription_from_address(&as_principal(SUBSCRIBER2), &addr(ANALYST))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAnalyst { .. }));
    }

    #[test]
    fn test_get_subscription_from_unknown_analyst() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();

        // SUBSCRIBER2 has never been subscribed to, so it has no record
        let err = service
            .registry()
            .get_subscription_from_address(&as_principal(SUBSCRIBER1), &addr(SUBSCRIBER2))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAnalyst { .. }));

        // a known analyst the caller does not follow
        service.subscribe(&as_principal(SUBSCRIBER2), "0xB0B", 1).unwrap();
        let err = service
            .registry()
            .get_subscription_from_address(&as_principal(SUBSCRIBER1), &addr("0xB0B"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSubscriber { .. }));
    }
}

mod unsubscribe_tests {
    use super::*;

    #[test]
    fn test_unsubscribe() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        let mut notifications = service.notifications();

        let event = service.unsubscribe(&as_principal(SUBSCRIBER1), ANALYST).unwrap();

        assert_eq!(event.requester, addr(SUBSCRIBER1));
        assert_eq!(event.subscriber, addr(SUBSCRIBER1));
        assert_eq!(event.analyst, addr(ANALYST));
        assert_eq!(event.calls, 5);
        match notifications.try_recv().unwrap() {
            RegistryNotification::Unsubscribed(published) => assert_eq!(published, event),
            other => panic!("Expected Unsubscribed, got {:?}", other),
        }
        assert!(notifications.try_recv().is_err());

        let analyst = as_principal(ANALYST);
        assert_eq!(service.registry().count_subscriptions(&analyst), 0);
        assert!(matches!(
            service.registry().get_subscription_by_address(&analyst, &addr(SUBSCRIBER1)).unwrap_err(),
            RegistryError::UnknownSubscriber { .. }
        ));
        // the record outlives its last subscriber
        assert!(service.registry().snapshot().record(&addr(ANALYST)).is_some());
        assert!(service.registry().get_subscriber_by_index(&analyst, 0).is_err());
    }

    #[test]
    fn test_unsubscribe_without_analyst_record() {
        let service = RegistryService::with_defaults();
        let mut notifications = service.notifications();

        let err = service.unsubscribe(&as_principal(SUBSCRIBER1), ANALYST).unwrap_err();

        assert_eq!(err.code(), "UNKNOWN_ANALYST");
        assert_eq!(err.http_status_code(), 404);
        assert!(notifications.try_recv().is_err());
        assert!(service.audit_log().is_empty());
    }

    #[test]
    fn test_unsubscribe_not_subscribed() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        let before = service.registry().snapshot();
        let mut notifications = service.notifications();

        let err = service.unsubscribe(&as_principal(SUBSCRIBER2), ANALYST).unwrap_err();

        assert_eq!(err.code(), "NOT_SUBSCRIBED");
        assert_eq!(service.registry().snapshot(), before);
        assert!(notifications.try_recv().is_err());
        assert_eq!(service.audit_log().len(), 1);
    }

    #[test]
    fn test_analyst_cannot_unsubscribe_others() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();

        // the analyst is not a subscriber of itself
        let err = service.unsubscribe(&as_principal(ANALYST), ANALYST).unwrap_err();
        assert_eq!(err.code(), "NOT_SUBSCRIBED");
        assert_eq!(service.registry().count_subscriptions(&as_principal(ANALYST)), 1);

        let event = service.unsubscribe(&as_principal(SUBSCRIBER1), ANALYST).unwrap();
        assert_eq!(event.calls, 5);
        assert_eq!(service.registry().count_subscriptions(&as_principal(ANALYST)), 0);
    }
}

mod atomicity_tests {
    use super::*;

    /// Factory that fails on demand.
    struct FlakyFactory {
        fail: AtomicBool,
        inner: TsidSubscriptionFactory,
    }

    impl SubscriptionFactory for FlakyFactory {
        fn provision(
            &self,
            subscriber: &Address,
            analyst: &Address,
            calls: u64,
        ) -> Result<SubscriptionHandle, ProvisioningError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProvisioningError::unavailable("factory offline"));
            }
            self.inner.provision(subscriber, analyst, calls)
        }
    }

    #[test]
    fn test_provisioning_failure_changes_nothing() {
        let factory = Arc::new(FlakyFactory {
            fail: AtomicBool::new(true),
            inner: TsidSubscriptionFactory::new("flaky"),
        });
        let service = RegistryService::new(factory.clone(), DEFAULT_NOTIFICATION_CAPACITY);
        let mut notifications = service.notifications();

        let err = service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap_err();

        assert_eq!(err.code(), "PROVISIONING_FAILED");
        assert_eq!(err.http_status_code(), 500);
        // not even the lazily created analyst record
        assert!(service.registry().snapshot().record(&addr(ANALYST)).is_none());
        assert!(notifications.try_recv().is_err());
        assert!(service.audit_log().is_empty());

        factory.fail.store(false, Ordering::SeqCst);
        let event = service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        assert!(event.subscription.as_str().starts_with("flaky-"));
    }

    #[test]
    fn test_audit_log_records_only_commits() {
        let service = RegistryService::with_defaults();
        service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5).unwrap();
        let _ = service.subscribe(&as_principal(SUBSCRIBER1), ANALYST, 5);
        let _ = service.unsubscribe(&as_principal(SUBSCRIBER2), ANALYST);
        service.unsubscribe(&as_principal(SUBSCRIBER1), ANALYST).unwrap();

        let log = service.audit_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].operation, "SubscribeCommand");
        assert_eq!(log[0].principal_id, SUBSCRIBER1);
        assert!(log[0].operation_json.as_deref().unwrap().contains("\"calls\":5"));
        assert_eq!(log[1].operation, "UnsubscribeCommand");
        assert_eq!(log[0].entity_id, log[1].entity_id);
    }

    #[test]
    fn test_concurrent_subscribers_stay_consistent() {
        let service = Arc::new(RegistryService::with_defaults());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let service = service.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let me = as_principal(&format!("0xT{}S{}", t, i));
                        service.subscribe(&me, ANALYST, 1).unwrap();
                        if i % 2 == 0 {
                            service.unsubscribe(&me, ANALYST).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(service.registry().is_consistent());
        assert_eq!(service.registry().count_subscriptions(&as_principal(ANALYST)), 8 * 25);
    }
}
