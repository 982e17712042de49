//! Tests for the contact status engine service.

#[cfg(test)]
mod tests {
    use crate::accounts::AccountType;
    use crate::contacts::{
        contact_status, Contact, ContactService, ContactServiceTrait, ContactStatus,
        ContactUpdate, NewContact,
    };
    use crate::errors::{Error, ValidationError};
    use crate::events::DomainEvent;
    use crate::testing::{account, contact, now, Fixture};
    use ContactStatus::*;

    fn service(fx: &Fixture) -> ContactService {
        ContactService::new(
            fx.remote.clone(),
            fx.remote.clone(),
            fx.cache.clone(),
            fx.events.clone(),
        )
    }

    /// Account 10 with contacts 1 (PRIMARY) and 2 (ACTIVE).
    fn seeded() -> Fixture {
        let fx = Fixture::new();
        fx.remote.add_account(account(10, "Acme", AccountType::Organization));
        fx.remote.add_contact(contact(1, 10, "Ana", Primary));
        fx.remote.add_contact(contact(2, 10, "Ben", Active));
        fx
    }

    fn ids(contacts: &[Contact]) -> Vec<i64> {
        contacts.iter().map(|c| c.id).collect()
    }

    fn statuses(contacts: &[Contact]) -> Vec<(i64, ContactStatus)> {
        contacts.iter().map(|c| (c.id, c.status)).collect()
    }

    #[tokio::test]
    async fn test_create_primary_demotes_existing_primary() {
        let fx = seeded();
        let svc = service(&fx);

        let contacts = svc
            .create(
                10,
                NewContact {
                    name: "Cleo".to_string(),
                    status: Some(Primary),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(ids(&contacts), vec![3, 1, 2]);
        assert_eq!(
            statuses(&contacts),
            vec![(3, Primary), (1, Active), (2, Active)]
        );
        assert!(contact_status::holds_invariant(&fx.remote.stored_contacts(10)));
        assert_eq!(
            fx.remote.mutations(),
            vec!["update_contact:1".to_string(), "create_contact:10".to_string()]
        );
        assert_eq!(
            fx.events.events(),
            vec![DomainEvent::contacts_changed(10, vec![1, 3])]
        );
    }

    #[tokio::test]
    async fn test_create_with_primary_flag_only() {
        let fx = seeded();

        let contacts = service(&fx)
            .create(
                10,
                NewContact {
                    name: "Cleo".to_string(),
                    is_primary: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(contacts[0].id, 3);
        assert!(contacts[0].is_primary);
        assert_eq!(contact_status::primary_count(&contacts), 1);
    }

    #[tokio::test]
    async fn test_create_active_leaves_primary_alone() {
        let fx = seeded();

        let contacts = service(&fx)
            .create(
                10,
                NewContact {
                    name: "Cleo".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            statuses(&contacts),
            vec![(1, Primary), (2, Active), (3, Active)]
        );
        assert_eq!(fx.remote.mutations(), vec!["create_contact:10".to_string()]);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_and_inactive_status() {
        let fx = seeded();
        let svc = service(&fx);

        let err = svc
            .create(10, NewContact::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(_))
        ));

        let err = svc
            .create(
                10,
                NewContact {
                    name: "Dora".to_string(),
                    status: Some(Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(fx.remote.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_create_on_deleted_account_is_rejected() {
        let fx = seeded();
        let mut deleted = account(11, "Gone", AccountType::Organization);
        deleted.deleted_at = Some(now());
        fx.remote.add_account(deleted);

        let err = service(&fx)
            .create(
                11,
                NewContact {
                    name: "Eve".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_set_primary_swaps_primary() {
        let fx = seeded();

        let contacts = service(&fx).set_primary(10, 2).await.unwrap();

        assert_eq!(statuses(&contacts), vec![(2, Primary), (1, Active)]);
        // Demotion is issued before the promotion.
        assert_eq!(
            fx.remote.mutations(),
            vec!["update_contact:1".to_string(), "update_contact:2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_set_primary_twice_is_idempotent() {
        let fx = seeded();
        let svc = service(&fx);

        let first = svc.set_primary(10, 2).await.unwrap();
        let mutations = fx.remote.mutations().len();
        let second = svc.set_primary(10, 2).await.unwrap();

        assert_eq!(statuses(&first), statuses(&second));
        assert_eq!(fx.remote.mutations().len(), mutations);
        assert_eq!(fx.events.len(), 1);
    }

    #[tokio::test]
    async fn test_set_primary_rejects_foreign_contact() {
        let fx = seeded();
        fx.remote.add_account(account(20, "Other", AccountType::Organization));
        fx.remote.add_contact(contact(5, 20, "Finn", Active));

        let err = service(&fx).set_primary(10, 5).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(fx.remote.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_set_primary_rejects_inactive_contact() {
        let fx = seeded();
        fx.remote.add_contact(contact(3, 10, "Cleo", Inactive));

        let err = service(&fx).set_primary(10, 3).await.unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_failed_promotion_leaves_no_second_primary() {
        let fx = seeded();
        fx.remote.fail_on("update_contact:2");
        let svc = service(&fx);

        let err = svc.set_primary(10, 2).await.unwrap_err();

        assert!(err.is_retryable());
        let stored = fx.remote.stored_contacts(10);
        assert!(contact_status::primary_count(&stored) <= 1);
        assert!(fx.events.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_to_primary_via_flag() {
        let fx = seeded();

        let contacts = service(&fx)
            .update(
                2,
                ContactUpdate {
                    is_primary: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(statuses(&contacts), vec![(2, Primary), (1, Active)]);
    }

    #[tokio::test]
    async fn test_update_fields_and_status_together() {
        let fx = seeded();

        let contacts = service(&fx)
            .update(
                2,
                ContactUpdate {
                    job_title: Some("Head of Post".to_string()),
                    status: Some(Primary),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(contacts[0].id, 2);
        assert_eq!(contacts[0].job_title.as_deref(), Some("Head of Post"));
        assert!(contacts[0].is_primary());
    }

    #[tokio::test]
    async fn test_update_contradictory_patch_is_rejected() {
        let fx = seeded();

        let err = service(&fx)
            .update(
                2,
                ContactUpdate {
                    status: Some(Primary),
                    is_primary: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_inactive_contact_cannot_be_reinstated() {
        let fx = seeded();
        fx.remote.add_contact(contact(3, 10, "Cleo", Inactive));

        let err = service(&fx)
            .update(3, ContactUpdate::status(Active))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_deactivate_primary_leaves_account_without_primary() {
        let fx = seeded();

        let contacts = service(&fx).deactivate(1).await.unwrap();

        assert_eq!(statuses(&contacts), vec![(2, Active), (1, Inactive)]);
        assert!(!contacts[1].is_primary);
        assert_eq!(
            fx.remote.mutations(),
            vec!["deactivate_contact:1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_deactivate_all() {
        let fx = seeded();
        fx.remote.add_contact(contact(3, 10, "Cleo", Inactive));

        let contacts = service(&fx).deactivate_all(10).await.unwrap();

        assert!(contacts.iter().all(|c| c.is_inactive() && !c.is_primary));
        assert_eq!(ids(&contacts), vec![1, 2, 3]);
        assert_eq!(fx.remote.count_calls("deactivate_contact"), 2);
    }

    #[tokio::test]
    async fn test_list_contacts_hides_inactive_and_uses_cache() {
        let fx = seeded();
        fx.remote.add_contact(contact(3, 10, "Cleo", Inactive));
        let svc = service(&fx);

        let visible = svc.list_contacts(10, false).await.unwrap();
        let all = svc.list_contacts(10, true).await.unwrap();

        assert_eq!(ids(&visible), vec![1, 2]);
        assert_eq!(ids(&all), vec![1, 2, 3]);
        assert_eq!(fx.remote.count_calls("contacts"), 1);
    }

    #[tokio::test]
    async fn test_mutation_invalidates_cached_contacts() {
        let fx = seeded();
        let svc = service(&fx);
        svc.list_contacts(10, false).await.unwrap();

        svc.set_primary(10, 2).await.unwrap();
        let listed = svc.list_contacts(10, false).await.unwrap();

        assert_eq!(listed[0].id, 2);
    }
}
