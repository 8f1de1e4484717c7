//! End-to-end flows through the controller, the session worker and a provider.

use aikesif_application::{
    AppContext, AuthMode, FAVORITES_LOGIN_REQUIRED, Panel, SIGN_UP_SUCCEEDED, SessionReply,
    SessionRequest, SessionWorker, ToggleOutcome,
};
use aikesif_catalog::Catalog;
use aikesif_core::{AuthEvent, Category, CategoryFilter, FavoritesSet, Settings};
use aikesif_storage::{LocalAuth, Storage};
use serde_json::json;

use crate::{MemoryProvider, sample_tools, session_with};

fn context() -> anyhow::Result<AppContext> {
    Ok(AppContext::new(
        Settings::default(),
        Catalog::from_tools(sample_tools())?,
    ))
}

fn visible_ids(ctx: &AppContext) -> Vec<String> {
    ctx.visible_tools().iter().map(|t| t.id.clone()).collect()
}

/// Applies replies until one matching `done` has been applied.
fn pump_until(
    ctx: &mut AppContext,
    worker: &SessionWorker,
    done: impl Fn(&SessionReply) -> bool,
) -> anyhow::Result<()> {
    loop {
        let reply = worker
            .recv()
            .ok_or_else(|| anyhow::anyhow!("session worker stopped"))?;
        let stop = done(&reply);
        ctx.apply_reply(reply);
        if stop {
            return Ok(());
        }
    }
}

fn restore(ctx: &mut AppContext, worker: &SessionWorker) -> anyhow::Result<()> {
    assert!(worker.send(SessionRequest::Restore));
    pump_until(ctx, worker, |reply| matches!(reply, SessionReply::Restored(_)))
}

fn save_favorite(ctx: &mut AppContext, worker: &SessionWorker, id: &str) -> anyhow::Result<()> {
    let ToggleOutcome::Changed {
        ticket, favorites, ..
    } = ctx.toggle_favorite(id)
    else {
        anyhow::bail!("toggle needed a session");
    };
    assert!(worker.send(SessionRequest::SaveFavorites { ticket, favorites }));
    pump_until(ctx, worker, |reply| {
        matches!(reply, SessionReply::FavoritesSaved { .. })
    })
}

#[test]
fn category_search_and_favorites_filters() -> anyhow::Result<()> {
    let provider = MemoryProvider::signed_in_as(session_with(json!({ "favorites": ["B"] })), "pw");
    let worker = SessionWorker::spawn(provider)?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;

    ctx.select_category(CategoryFilter::Only(Category::Gorsel));
    assert_eq!(visible_ids(&ctx), vec!["B"]);

    ctx.select_category(CategoryFilter::All);
    ctx.set_query("asis");
    assert_eq!(visible_ids(&ctx), vec!["A"]);

    ctx.set_query("");
    ctx.set_favorites_only(true);
    assert_eq!(visible_ids(&ctx), vec!["B"]);
    Ok(())
}

#[test]
fn session_event_replaces_local_favorites() -> anyhow::Result<()> {
    let provider = MemoryProvider::signed_in_as(session_with(json!({ "favorites": ["A"] })), "pw");
    let listeners = provider.listeners().clone();
    let worker = SessionWorker::spawn(provider)?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;
    assert_eq!(ctx.favorites, FavoritesSet::from_ids(["A"]));

    let _ = ctx.toggle_favorite("B");
    listeners.emit(
        AuthEvent::UserUpdated,
        Some(&session_with(json!({ "favorites": ["x", "y"] }))),
    );
    pump_until(&mut ctx, &worker, |reply| {
        matches!(reply, SessionReply::Changed { .. })
    })?;
    assert_eq!(ctx.favorites, FavoritesSet::from_ids(["x", "y"]));
    Ok(())
}

#[test]
fn weak_password_sign_up_stays_on_form() -> anyhow::Result<()> {
    let worker = SessionWorker::spawn(MemoryProvider::new())?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;

    ctx.open_account();
    ctx.account.switch_mode();
    ctx.account.first_name = "Ada".to_string();
    ctx.account.last_name = "Lovelace".to_string();
    ctx.account.email = "ada@example.com".to_string();
    ctx.account.password = "123".to_string();
    ctx.account.field_of_work = "Matematik".to_string();

    let request = ctx
        .submit_account()
        .ok_or_else(|| anyhow::anyhow!("form rejected"))?;
    assert!(worker.send(request));
    pump_until(&mut ctx, &worker, |reply| {
        matches!(reply, SessionReply::SignedUp(_))
    })?;

    assert_eq!(ctx.panel, Panel::Account);
    assert_eq!(ctx.account.mode, AuthMode::SignUp);
    assert_eq!(
        ctx.account.error.as_deref(),
        Some("Password should be at least 6 characters.")
    );
    assert!(!ctx.account.submitting);
    assert!(ctx.user.is_none());
    Ok(())
}

#[test]
fn sign_up_then_sign_in_loads_profile() -> anyhow::Result<()> {
    let worker = SessionWorker::spawn(MemoryProvider::new())?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;

    ctx.open_account();
    ctx.account.switch_mode();
    ctx.account.first_name = "Ada".to_string();
    ctx.account.last_name = "Lovelace".to_string();
    ctx.account.email = "ada@example.com".to_string();
    ctx.account.password = "secret1".to_string();
    ctx.account.field_of_work = "Matematik".to_string();
    let request = ctx
        .submit_account()
        .ok_or_else(|| anyhow::anyhow!("form rejected"))?;
    assert!(worker.send(request));
    pump_until(&mut ctx, &worker, |reply| {
        matches!(reply, SessionReply::SignedUp(_))
    })?;
    assert_eq!(ctx.alert.as_deref(), Some(SIGN_UP_SUCCEEDED));
    assert_eq!(ctx.account.mode, AuthMode::Login);
    assert!(ctx.user.is_none());

    ctx.dismiss_alert();
    ctx.account.password = "secret1".to_string();
    let request = ctx
        .submit_account()
        .ok_or_else(|| anyhow::anyhow!("form rejected"))?;
    assert!(worker.send(request));
    pump_until(&mut ctx, &worker, |reply| {
        matches!(reply, SessionReply::SignedIn(_))
    })?;

    let user = ctx.user.clone().ok_or_else(|| anyhow::anyhow!("not signed in"))?;
    assert_eq!(user.display_name(), "Ada Lovelace");
    assert_eq!(user.field_of_work, "Matematik");
    assert!(ctx.account.error.is_none());
    Ok(())
}

#[test]
fn toggle_without_session_does_not_mutate() -> anyhow::Result<()> {
    let worker = SessionWorker::spawn(MemoryProvider::new())?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;

    assert_eq!(ctx.toggle_favorite("A"), ToggleOutcome::AuthRequired);
    assert!(ctx.favorites.is_empty());
    assert_eq!(ctx.panel, Panel::Account);
    assert_eq!(ctx.alert.as_deref(), Some(FAVORITES_LOGIN_REQUIRED));
    Ok(())
}

#[test]
fn toggle_is_persisted_and_reversible() -> anyhow::Result<()> {
    let provider = MemoryProvider::signed_in_as(session_with(json!({})), "pw");
    let worker = SessionWorker::spawn(provider)?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;

    save_favorite(&mut ctx, &worker, "A")?;
    assert_eq!(ctx.favorites, FavoritesSet::from_ids(["A"]));
    assert!(!ctx.has_pending_saves());

    save_favorite(&mut ctx, &worker, "A")?;
    assert!(ctx.favorites.is_empty());
    assert!(ctx.toast.is_none());
    Ok(())
}

#[test]
fn rejected_write_rolls_back_and_reports() -> anyhow::Result<()> {
    let mut provider = MemoryProvider::signed_in_as(session_with(json!({ "favorites": ["B"] })), "pw");
    provider.fail_updates = true;
    let worker = SessionWorker::spawn(provider)?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;

    save_favorite(&mut ctx, &worker, "A")?;
    assert_eq!(ctx.favorites, FavoritesSet::from_ids(["B"]));
    assert_eq!(
        ctx.toast.as_deref(),
        Some("Favoriler kaydedilemedi: Database error: write rejected")
    );
    Ok(())
}

#[test]
fn failed_restore_opens_signed_out_catalog() -> anyhow::Result<()> {
    let mut provider = MemoryProvider::new();
    provider.fail_restore = true;
    let worker = SessionWorker::spawn(provider)?;
    let mut ctx = context()?;
    assert!(ctx.loading);
    restore(&mut ctx, &worker)?;

    assert!(!ctx.loading);
    assert!(ctx.user.is_none());
    assert_eq!(ctx.panel, Panel::Catalog);
    assert!(ctx.toast.is_some());
    Ok(())
}

#[test]
fn sign_out_clears_user_and_favorites() -> anyhow::Result<()> {
    let provider = MemoryProvider::signed_in_as(session_with(json!({ "favorites": ["A"] })), "pw");
    let worker = SessionWorker::spawn(provider)?;
    let mut ctx = context()?;
    restore(&mut ctx, &worker)?;
    ctx.open_account();
    ctx.set_favorites_only(true);

    assert!(worker.send(SessionRequest::SignOut));
    pump_until(&mut ctx, &worker, |reply| {
        matches!(reply, SessionReply::SignedOut(_))
    })?;
    assert!(ctx.user.is_none());
    assert!(ctx.favorites.is_empty());
    assert_eq!(ctx.panel, Panel::Catalog);
    assert!(!ctx.favorites_only);
    Ok(())
}

#[test]
fn shutdown_releases_subscription() -> anyhow::Result<()> {
    let provider = MemoryProvider::new();
    let listeners = provider.listeners().clone();
    let worker = SessionWorker::spawn(provider)?;
    assert_eq!(listeners.len(), 1);
    worker.shutdown();
    assert!(listeners.is_empty());
    Ok(())
}

#[test]
fn local_auth_through_worker() -> anyhow::Result<()> {
    let auth = LocalAuth::new(Storage::open_in_memory()?, 6);
    let worker = SessionWorker::spawn(auth)?;
    let mut ctx = AppContext::new(Settings::default(), Catalog::bundled()?);
    restore(&mut ctx, &worker)?;
    assert!(ctx.user.is_none());

    let tool_id = ctx.catalog.tools()[0].id.clone();
    ctx.open_account();
    ctx.account.switch_mode();
    ctx.account.first_name = "Ada".to_string();
    ctx.account.last_name = "Lovelace".to_string();
    ctx.account.email = "Ada@Example.com".to_string();
    ctx.account.password = "secret1".to_string();
    ctx.account.field_of_work = String::new();
    assert!(ctx.submit_account().is_none());
    ctx.account.field_of_work = "Matematik".to_string();

    let request = ctx
        .submit_account()
        .ok_or_else(|| anyhow::anyhow!("form rejected"))?;
    assert!(worker.send(request));
    pump_until(&mut ctx, &worker, |reply| {
        matches!(reply, SessionReply::SignedUp(_))
    })?;
    ctx.dismiss_alert();

    ctx.account.password = "secret1".to_string();
    let request = ctx
        .submit_account()
        .ok_or_else(|| anyhow::anyhow!("form rejected"))?;
    assert!(worker.send(request));
    pump_until(&mut ctx, &worker, |reply| {
        matches!(reply, SessionReply::SignedIn(_))
    })?;
    assert!(ctx.is_signed_in());
    assert_eq!(
        ctx.user.as_ref().map(|u| u.email.as_str()),
        Some("ada@example.com")
    );

    save_favorite(&mut ctx, &worker, &tool_id)?;
    assert!(ctx.favorites.contains(&tool_id));

    assert!(worker.send(SessionRequest::Restore));
    let mut fresh = AppContext::new(Settings::default(), Catalog::bundled()?);
    pump_until(&mut fresh, &worker, |reply| {
        matches!(reply, SessionReply::Restored(_))
    })?;
    assert!(fresh.favorites.contains(&tool_id));
    Ok(())
}
