//! Mounting, scheduling, listener turnover and teardown.

use core::cell::Cell;
use core::time::Duration;
use std::rc::Rc;

use anyhow::{Context as _, Result, bail};
use serde_json::json;
use tokio::task::LocalSet;
use weft::{App, Fragment, Lifecycle, StateMap, parse};

fn labelled_button(state: &StateMap) -> Result<Fragment> {
    let label = state
        .get("label")
        .and_then(|label| label.as_str().map(str::to_owned))
        .unwrap_or_default();
    parse(&format!(
        "<button id=\"go\" data-events='{{\"click\":\"go\"}}'>{}</button><p>{}</p>",
        weft::escape(&label),
        weft::escape(&label)
    ))
}

#[tokio::test]
async fn state_changes_in_one_turn_render_once() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.mount(labelled_button)?;

            app.set_state("label", "a");
            app.set_state("label", "b");
            app.set_state("label", "c");
            assert!(app.is_render_pending());
            app.settle().await;

            assert_eq!(app.render_count(), 2);
            assert_eq!(app.coalesced_render_count(), 2);
            assert_eq!(
                app.inner_html(),
                "<button id=\"go\">c</button><p>c</p>"
            );
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn state_set_before_mount_does_not_schedule() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();

            app.set_state("label", "early");
            assert!(!app.is_render_pending());
            app.mount(labelled_button)?;

            assert_eq!(app.render_count(), 1);
            assert!(app.inner_html().contains("early"));
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn deleting_state_does_not_schedule() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.set_state("label", "kept");
            app.mount(labelled_button)?;

            assert_eq!(app.delete_state("label"), Some(json!("kept")));
            assert!(!app.is_render_pending());
            assert_eq!(app.get_state("label"), None);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn listeners_do_not_accumulate_across_renders() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            let clicks = Rc::new(Cell::new(0));
            let counter = Rc::clone(&clicks);
            app.on("go", move |_ctx| counter.set(counter.get() + 1));
            app.mount(labelled_button)?;

            for label in ["one", "two", "three"] {
                app.set_state("label", label);
                app.settle().await;
            }
            let button = app.query("id", "go").context("button missing")?;

            assert_eq!(app.render_count(), 4);
            assert_eq!(app.listener_count(button), 1);
            assert_eq!(app.total_listener_count(), 1);
            assert_eq!(app.dispatch(button, "click"), 1);
            assert_eq!(clicks.get(), 1);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn unresolved_handlers_bind_nothing() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.mount(labelled_button)?;
            let button = app.query("id", "go").context("button missing")?;

            assert_eq!(app.total_listener_count(), 0);
            assert_eq!(app.dispatch(button, "click"), 0);

            app.on("go", |_ctx| {});
            app.render_now();
            assert_eq!(app.listener_count(button), 1);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn unchanged_render_applies_no_mutations() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.on("go", |_ctx| {});
            app.set_state("label", "same");
            app.mount(|state: &StateMap| {
                let label = state.get_as::<String>("label").unwrap_or_default();
                parse(&format!(
                    "<ul><li>{label}</li><li>tail</li></ul>\
                     <button data-events='{{\"click\":\"go\"}}'>a</button>\
                     <button data-events='{{\"click\":\"go\"}}'>b</button>"
                ))
            })?;
            assert!(app.last_mutation_count() > 0);

            app.set_state("label", "same");
            app.settle().await;
            assert_eq!(app.last_mutation_count(), 0);
            assert_eq!(app.total_listener_count(), 2);
            assert!(!app.inner_html().contains("data-events"));

            app.set_state("label", "changed");
            app.settle().await;
            assert_eq!(app.last_mutation_count(), 1);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn failing_render_keeps_the_previous_content() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.set_state("label", "fine");
            app.on("go", |_ctx| {});
            app.mount(|state: &StateMap| {
                if state.get("broken").is_some() {
                    bail!("component cannot render");
                }
                labelled_button(state)
            })?;
            let before = app.inner_html();

            app.set_state("broken", true);
            app.settle().await;

            assert_eq!(app.inner_html(), before);
            assert_eq!(app.failed_render_count(), 1);
            assert_eq!(app.render_count(), 1);
            assert_eq!(app.total_listener_count(), 1);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn mounting_twice_is_an_error() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.mount(labelled_button)?;

            assert!(app.mount(labelled_button).is_err());
            assert_eq!(app.render_count(), 1);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn scopes_are_created_once_per_name() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            let first = app.create_scope("todo");
            first.set_state("items", json!(["milk"]));

            let second = app.create_scope("todo");

            assert_eq!(second.get_state("items"), Some(json!(["milk"])));
            assert!(app.get_scope("todo").is_some());
            assert!(app.get_scope("other").is_none());
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn destroyed_scope_handles_do_not_reach_a_new_scope() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            let old = app.create_scope("todo");
            old.on("add", |_ctx| {});
            old.set_state("items", json!([1]));

            old.destroy();
            assert!(!app.has_handler("todo:add"));
            assert!(app.get_scope("todo").is_none());

            let fresh = app.create_scope("todo");
            old.set_state("items", json!([2]));
            old.on("add", |_ctx| {});

            assert!(!old.is_alive());
            assert!(old.all().is_empty());
            assert_eq!(fresh.get_state("items"), None);
            assert!(!app.has_handler("todo:add"));

            fresh.on("add", |_ctx| {});
            assert!(!old.off("add"));
            assert!(app.has_handler("todo:add"));
            assert!(fresh.off("add"));
            assert!(!app.has_handler("todo:add"));
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn scopes_read_global_state() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.set_state("theme", "dark");
            let settings = app.create_scope("settings");

            assert_eq!(settings.get_global("theme"), Some(json!("dark")));
            assert_eq!(settings.get_state("theme"), None);
            anyhow::Ok(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn destroy_tears_everything_down() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            let ticks = Rc::new(Cell::new(0));
            let counter = Rc::clone(&ticks);
            let scope = app.create_scope("clock");
            scope.on("reset", |_ctx| {});
            app.on("go", |_ctx| {});
            app.set_state("label", "tick");
            app.mount(labelled_button)?;
            app.set_interval(Duration::from_millis(100), move |_app| {
                counter.set(counter.get() + 1);
            });

            tokio::time::sleep(Duration::from_millis(250)).await;
            assert_eq!(ticks.get(), 2);

            app.destroy();
            tokio::time::sleep(Duration::from_millis(500)).await;

            assert_eq!(ticks.get(), 2);
            assert_eq!(app.lifecycle(), Lifecycle::Destroyed);
            assert_eq!(app.inner_html(), "");
            assert_eq!(app.active_timer_count(), 0);
            assert_eq!(app.total_listener_count(), 0);
            assert!(app.get_scope("clock").is_none());
            assert!(!app.has_handler("go"));
            assert_eq!(app.get_state("label"), None);

            app.destroy();
            app.set_state("label", "late");
            assert_eq!(app.get_state("label"), None);
            assert!(app.mount(labelled_button).is_err());
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn destroy_drops_a_pending_render() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.mount(labelled_button)?;

            app.set_state("label", "never shown");
            app.destroy();
            tokio::task::yield_now().await;

            assert_eq!(app.render_count(), 1);
            assert!(!app.is_render_pending());
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn destroyed_application_accepts_no_scopes_or_handlers() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            app.destroy();

            let scope = app.create_scope("late");
            scope.set_state("items", json!([1]));
            scope.on("add", |_ctx| {});
            app.on("go", |_ctx| {});

            assert!(!scope.is_alive());
            assert_eq!(scope.get_state("items"), None);
            assert_eq!(app.scope_count(), 0);
            assert_eq!(app.handler_count(), 0);
            assert!(app.get_scope("late").is_none());
            anyhow::Ok(())
        })
        .await
}

#[tokio::test]
async fn listener_destroying_the_application_stops_bubbling() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    LocalSet::new()
        .run_until(async {
            let app = App::new();
            let outer_runs = Rc::new(Cell::new(0));
            let counter = Rc::clone(&outer_runs);
            app.on("quit", |ctx| ctx.app.destroy());
            app.on("outer", move |_ctx| counter.set(counter.get() + 1));
            app.mount(|_state: &StateMap| {
                parse(
                    r#"<div data-events='{"click":"outer"}'><button id="quit" data-events='{"click":"quit"}'>x</button></div>"#,
                )
            })?;
            let button = app.query("id", "quit").context("button missing")?;

            assert_eq!(app.dispatch(button, "click"), 1);
            assert_eq!(outer_runs.get(), 0);
            assert_eq!(app.lifecycle(), Lifecycle::Destroyed);
            anyhow::Ok(())
        })
        .await
}
