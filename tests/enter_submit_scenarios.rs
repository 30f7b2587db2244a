use std::cell::RefCell;
use std::rc::Rc;

use enter_submit::{
    EnterSubmit, Error, EventState, KeyInit, Page, PageAction, Result, SubmitPath,
};

fn installed(html: &str) -> Result<(Page, Rc<EnterSubmit>)> {
    let mut page = Page::from_html(html)?;
    let listener = EnterSubmit::install(&mut page)?;
    Ok((page, listener))
}

#[test]
fn global_hook_is_called_and_dom_is_untouched() -> Result<()> {
    let html = r#"
        <form id='loginForm'>
          <input id='user' name='user'>
          <input id='pw' type='password'>
          <button id='loginBtn' type='submit'>Login</button>
        </form>
        "#;
    let (mut page, _) = installed(html)?;
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    page.define_global_fn("doLogin", move |_: &mut Page| -> Result<()> {
        *counter.borrow_mut() += 1;
        Ok(())
    });

    page.press_enter("#user")?;
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(
        page.take_actions(),
        vec![PageAction::HookInvoked {
            name: "doLogin".into()
        }]
    );
    Ok(())
}

#[test]
fn password_form_is_submitted_through_request_submit() -> Result<()> {
    let html = r#"
        <form id='signin' action='/session'>
          <input id='user' name='user'>
          <input id='pw' type='password' name='pw'>
        </form>
        "#;
    let (mut page, _) = installed(html)?;
    let submits = Rc::new(RefCell::new(Vec::new()));
    let seen = submits.clone();
    page.add_event_listener(
        "#signin",
        "submit",
        false,
        move |page: &mut Page, event: &mut EventState| -> Result<()> {
            seen.borrow_mut().push(page.label(event.target()));
            Ok(())
        },
    )?;

    page.press_enter("#pw")?;
    assert_eq!(*submits.borrow(), vec!["#signin"]);
    // The native implicit submission is suppressed, so the form goes out once.
    assert_eq!(
        page.submissions(),
        vec![("#signin".to_string(), SubmitPath::RequestSubmit)]
    );
    Ok(())
}

#[test]
fn request_submit_still_runs_validation() -> Result<()> {
    let html = r#"
        <form id='signin'>
          <input id='user' required>
          <input id='pw' type='password' required>
        </form>
        "#;
    let (mut page, _) = installed(html)?;
    page.type_text("#pw", "hunter2")?;
    page.press_enter("#pw")?;
    assert_eq!(
        page.take_actions(),
        vec![PageAction::SubmitBlocked {
            form: "#signin".into(),
            invalid: "#user".into(),
        }]
    );
    Ok(())
}

#[test]
fn login_button_is_enabled_and_clicked() -> Result<()> {
    let html = r#"
        <div class='panel'>
          <input id='user' name='user'>
          <button id='loginBtn' disabled>Sign in</button>
        </div>
        "#;
    let (mut page, _) = installed(html)?;
    let clicks = Rc::new(RefCell::new(0));
    let counter = clicks.clone();
    page.add_event_listener(
        "#loginBtn",
        "click",
        false,
        move |_: &mut Page, _: &mut EventState| -> Result<()> {
            *counter.borrow_mut() += 1;
            Ok(())
        },
    )?;

    page.press_enter("#user")?;
    page.assert_disabled("#loginBtn", false)?;
    assert_eq!(*clicks.borrow(), 1);
    assert_eq!(
        page.take_actions(),
        vec![PageAction::Clicked {
            target: "#loginBtn".into()
        }]
    );
    Ok(())
}

#[test]
fn chinese_label_is_found_by_text_scan() -> Result<()> {
    let html = r#"
        <div>
          <input id='user'>
          <button id='cancel' type='button'>取消</button>
          <button id='go' type='button'> 登录 </button>
        </div>
        "#;
    let (mut page, _) = installed(html)?;
    page.press_enter("#user")?;
    assert_eq!(
        page.take_actions(),
        vec![PageAction::Clicked {
            target: "#go".into()
        }]
    );
    Ok(())
}

#[test]
fn page_without_login_affordance_only_prevents_default() -> Result<()> {
    let html = r#"
        <div>
          <input id='search'>
          <a id='home' href='/'>Home</a>
        </div>
        "#;
    let (mut page, _) = installed(html)?;
    page.focus("#home")?;
    let event = page.key_down(KeyInit::enter())?;
    assert!(event.default_prevented());
    assert!(page.actions().is_empty());
    Ok(())
}

#[test]
fn capture_listener_runs_before_page_handlers() -> Result<()> {
    let html = "<form id='f'><input id='pw' type='password'></form>";
    let (mut page, _) = installed(html)?;
    let observed = Rc::new(RefCell::new(Vec::new()));
    let seen = observed.clone();
    page.add_event_listener(
        "#pw",
        "keydown",
        true,
        move |_: &mut Page, event: &mut EventState| -> Result<()> {
            seen.borrow_mut().push(event.default_prevented());
            event.stop_propagation();
            Ok(())
        },
    )?;

    page.press_enter("#pw")?;
    assert_eq!(*observed.borrow(), vec![true]);
    assert_eq!(page.submissions().len(), 1);
    Ok(())
}

#[test]
fn composing_enter_is_left_alone() -> Result<()> {
    let html = "<form id='f'><input id='q'></form>";
    let (mut page, listener) = installed(html)?;
    page.focus("#q")?;
    let event = page.key_down(KeyInit::enter().composing())?;
    assert!(!event.default_prevented());
    assert!(!listener.is_fired());
    assert!(page.actions().is_empty());
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn other_keys_keep_their_defaults() -> Result<()> {
    let html = "<button id='loginBtn'>Login</button>";
    let (mut page, listener) = installed(html)?;
    for key in ["a", "Tab", "enter", "NumpadEnter", " "] {
        let event = page.key_down(KeyInit::new(key))?;
        assert!(!event.default_prevented(), "{key:?} was prevented");
    }
    assert!(!listener.is_fired());
    assert!(page.actions().is_empty());
    Ok(())
}

#[test]
fn repeated_enter_inside_window_triggers_once() -> Result<()> {
    let html = "<button id='loginBtn' type='button'>Login</button>";
    let (mut page, listener) = installed(html)?;

    for _ in 0..5 {
        let event = page.key_down(KeyInit::enter())?;
        assert!(event.default_prevented());
        page.advance_time(150)?;
    }
    assert_eq!(page.now_ms(), 750);
    assert!(listener.is_fired());
    assert_eq!(page.take_actions().len(), 1);

    page.advance_time(49)?;
    page.key_down(KeyInit::enter())?;
    assert!(page.actions().is_empty());

    page.advance_time(1)?;
    assert!(!listener.is_fired());
    page.key_down(KeyInit::enter())?;
    assert_eq!(page.take_actions().len(), 1);
    Ok(())
}

#[test]
fn rearm_timer_fires_even_after_page_changes() -> Result<()> {
    let html = "<button id='loginBtn' type='button'>Login</button>";
    let (mut page, listener) = installed(html)?;
    page.key_down(KeyInit::enter())?;
    let button = page
        .get_element_by_id("loginBtn")
        .ok_or_else(|| Error::SelectorNotFound("#loginBtn".into()))?;
    page.set_attr(button, "id", "renamed")?;

    page.flush()?;
    assert!(!listener.is_fired());
    page.key_down(KeyInit::enter())?;
    // #renamed still matches the label scan.
    assert_eq!(
        page.take_actions(),
        vec![
            PageAction::Clicked {
                target: "#loginBtn".into()
            },
            PageAction::Clicked {
                target: "#renamed".into()
            },
        ]
    );
    Ok(())
}

#[test]
fn hook_that_presses_enter_again_is_debounced() -> Result<()> {
    let html = "<input id='pw' type='password'>";
    let (mut page, _) = installed(html)?;
    let depth = Rc::new(RefCell::new(0));
    let counter = depth.clone();
    page.define_global_fn("doLogin", move |page: &mut Page| -> Result<()> {
        *counter.borrow_mut() += 1;
        page.key_down(KeyInit::enter())?;
        Ok(())
    });

    page.press_enter("#pw")?;
    assert_eq!(*depth.borrow(), 1);
    Ok(())
}

#[test]
fn hook_errors_never_reach_the_caller() -> Result<()> {
    let html = "<form id='f'><input id='pw' type='password'></form>";
    let (mut page, _) = installed(html)?;
    page.define_global_fn("doLogin", |_: &mut Page| -> Result<()> {
        Err(Error::hook("doLogin", "server rejected credentials"))
    });
    page.press_enter("#pw")?;
    assert!(page.submissions().is_empty());
    Ok(())
}

#[test]
fn install_twice_is_rejected() -> Result<()> {
    let (mut page, _) = installed("<p>x</p>")?;
    assert_eq!(
        EnterSubmit::install(&mut page).err(),
        Some(Error::AlreadyInstalled)
    );
    Ok(())
}
