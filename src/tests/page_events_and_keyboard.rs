use super::*;

#[test]
fn keydown_visits_capture_target_then_bubble() -> Result<()> {
    let mut page = Page::from_html(
        r#"
        <div id='outer'><input id='field'></div>
        "#,
    )?;
    let log = recorder();

    for (selector, capture, tag) in [
        ("#outer", true, "outer-capture"),
        ("#outer", false, "outer-bubble"),
        ("#field", false, "field-bubble"),
        ("#field", true, "field-capture"),
    ] {
        let log = log.clone();
        page.add_event_listener(
            selector,
            "keydown",
            capture,
            move |_: &mut Page, event: &mut EventState| -> Result<()> {
                log.borrow_mut().push(format!("{tag}:{:?}", event.phase()));
                Ok(())
            },
        )?;
    }
    let log_doc = log.clone();
    page.add_document_listener(
        "keydown",
        true,
        move |_: &mut Page, _: &mut EventState| -> Result<()> {
            log_doc.borrow_mut().push("document-capture".into());
            Ok(())
        },
    );

    page.press_key("#field", KeyInit::new("a"))?;
    assert_eq!(
        *log.borrow(),
        vec![
            "document-capture",
            "outer-capture:Capturing",
            "field-capture:AtTarget",
            "field-bubble:AtTarget",
            "outer-bubble:Bubbling",
        ]
    );
    Ok(())
}

#[test]
fn stop_propagation_in_capture_hides_event_from_target() -> Result<()> {
    let mut page = Page::from_html("<input id='field'>")?;
    let log = recorder();
    page.add_document_listener(
        "keydown",
        true,
        |_: &mut Page, event: &mut EventState| -> Result<()> {
            event.stop_propagation();
            Ok(())
        },
    );
    let seen = log.clone();
    page.add_event_listener(
        "#field",
        "keydown",
        false,
        move |_: &mut Page, _: &mut EventState| -> Result<()> {
            seen.borrow_mut().push("target".into());
            Ok(())
        },
    )?;

    page.press_key("#field", KeyInit::new("x"))?;
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn key_down_without_focus_targets_body() -> Result<()> {
    let mut page = Page::from_html("<html><body id='b'><p>x</p></body></html>")?;
    let event = page.key_down(KeyInit::new("a"))?;
    assert_eq!(Some(event.target()), page.get_element_by_id("b"));
    Ok(())
}

#[test]
fn key_down_without_body_targets_document() -> Result<()> {
    let mut page = Page::from_html("<p>x</p>")?;
    let event = page.key_down(KeyInit::new("a"))?;
    assert_eq!(event.target(), page.document());
    Ok(())
}

#[test]
fn key_down_targets_focused_element() -> Result<()> {
    let mut page = Page::from_html("<input id='a'><input id='b'>")?;
    page.focus("#b")?;
    let event = page.key_down(KeyInit::new("Tab"))?;
    assert_eq!(Some(event.target()), page.get_element_by_id("b"));
    assert_eq!(page.active_element(), page.get_element_by_id("b"));
    page.blur()?;
    assert_eq!(page.active_element(), None);
    Ok(())
}

#[test]
fn enter_in_text_field_submits_owner_form() -> Result<()> {
    let mut page = Page::from_html(
        r#"
        <form id='search'><input id='q' type='search'></form>
        "#,
    )?;
    page.press_enter("#q")?;
    assert_eq!(
        page.take_actions(),
        vec![PageAction::Submitted {
            form: "#search".into(),
            path: SubmitPath::Implicit,
        }]
    );
    Ok(())
}

#[test]
fn enter_on_checkbox_or_textarea_does_not_submit() -> Result<()> {
    let mut page = Page::from_html(
        r#"
        <form id='f'>
          <input id='c' type='checkbox'>
          <textarea id='t'></textarea>
        </form>
        "#,
    )?;
    page.press_enter("#c")?;
    page.press_enter("#t")?;
    assert!(page.actions().is_empty());
    Ok(())
}

#[test]
fn enter_on_button_clicks_it() -> Result<()> {
    let mut page = Page::from_html("<button id='b' type='button'>go</button>")?;
    page.press_enter("#b")?;
    assert_eq!(
        page.take_actions(),
        vec![PageAction::Clicked {
            target: "#b".into()
        }]
    );
    Ok(())
}

#[test]
fn composing_enter_has_no_native_default() -> Result<()> {
    let mut page = Page::from_html("<form id='f'><input id='q'></form>")?;
    page.press_key("#q", KeyInit::enter().composing())?;
    assert!(page.actions().is_empty());
    Ok(())
}

#[test]
fn prevented_keydown_suppresses_native_enter() -> Result<()> {
    let mut page = Page::from_html("<form id='f'><input id='q'></form>")?;
    page.add_event_listener(
        "#q",
        "keydown",
        false,
        |_: &mut Page, event: &mut EventState| -> Result<()> {
            event.prevent_default();
            Ok(())
        },
    )?;
    page.press_enter("#q")?;
    assert!(page.actions().is_empty());
    Ok(())
}

#[test]
fn keyup_follows_keydown() -> Result<()> {
    let mut page = Page::from_html("<input id='q'>")?;
    let log = recorder();
    for event_type in ["keydown", "keyup"] {
        let log = log.clone();
        page.add_event_listener(
            "#q",
            event_type,
            false,
            move |_: &mut Page, event: &mut EventState| -> Result<()> {
                log.borrow_mut().push(format!(
                    "{}:{}",
                    event.event_type(),
                    event.key().unwrap_or_default()
                ));
                Ok(())
            },
        )?;
    }
    page.press_key("#q", KeyInit::new("k"))?;
    assert_eq!(*log.borrow(), vec!["keydown:k", "keyup:k"]);
    Ok(())
}

#[test]
fn disabled_target_receives_no_key_events() -> Result<()> {
    let mut page = Page::from_html("<form id='f'><input id='q' disabled></form>")?;
    let log = recorder();
    let seen = log.clone();
    page.add_document_listener(
        "keydown",
        true,
        move |_: &mut Page, _: &mut EventState| -> Result<()> {
            seen.borrow_mut().push("keydown".into());
            Ok(())
        },
    );
    page.press_enter("#q")?;
    assert!(log.borrow().is_empty());
    assert!(page.actions().is_empty());
    Ok(())
}

#[test]
fn listener_errors_propagate_to_caller() -> Result<()> {
    let mut page = Page::from_html("<input id='q'>")?;
    page.add_event_listener(
        "#q",
        "keydown",
        false,
        |_: &mut Page, _: &mut EventState| -> Result<()> { Err(Error::Runtime("boom".into())) },
    )?;
    let err = page
        .press_key("#q", KeyInit::new("a"))
        .expect_err("listener failure should surface");
    assert_eq!(err, Error::Runtime("boom".into()));
    Ok(())
}
