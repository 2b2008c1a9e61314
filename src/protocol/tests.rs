// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::error::ProtocolError;
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::envelope::Envelope;
use crate::protocol::message::*;
use std::sync::{Arc, Mutex};

#[test]
fn test_join_then_login_flow() {
    let outbox: Arc<Mutex<Vec<Message>>> = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Dispatcher::new();

    // =================== Step 1: JoinRes triggers login ===================
    {
        let outbox = outbox.clone();
        dispatcher
            .on::<JoinRes, _>(move |res| {
                if res.is_success() {
                    outbox
                        .lock()
                        .unwrap()
                        .push(LoginReq::new("tuuna2983", "password").into());
                }
                Ok(())
            })
            .unwrap();
    }

    // =================== Step 2: LoginRes is recorded ===================
    let logged_in = Arc::new(Mutex::new(None));
    {
        let logged_in = logged_in.clone();
        dispatcher
            .on::<LoginRes, _>(move |res| {
                *logged_in.lock().unwrap() = Some(res.is_success());
                Ok(())
            })
            .unwrap();
    }

    // =================== Step 3: Server replies arrive ===================
    let join = JoinRes {
        error_code: ERROR_CODE_NONE,
    }
    .encode()
    .unwrap();
    dispatcher.dispatch(&Envelope::from_frame(&join)).unwrap();

    let sent = outbox.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Message::LoginReq(req) => {
            assert_eq!(req.user_id.trimmed(), b"tuuna2983");
            assert_eq!(req.password.trimmed(), b"password");
        }
        other => panic!("Expected LoginReq, got {other:?}"),
    }

    let login = LoginRes {
        error_code: ERROR_CODE_NONE,
    }
    .encode()
    .unwrap();
    dispatcher.dispatch(&Envelope::from_frame(&login)).unwrap();
    assert_eq!(*logged_in.lock().unwrap(), Some(true));
}

#[test]
fn test_failed_join_does_not_login() {
    let attempts = Arc::new(Mutex::new(0u32));
    let dispatcher = Dispatcher::new();
    {
        let attempts = attempts.clone();
        dispatcher
            .on::<JoinRes, _>(move |res| {
                if res.is_success() {
                    *attempts.lock().unwrap() += 1;
                }
                Ok(())
            })
            .unwrap();
    }

    let rejected = JoinRes { error_code: 3 }.encode().unwrap();
    dispatcher.dispatch(&Envelope::from_frame(&rejected)).unwrap();
    assert_eq!(*attempts.lock().unwrap(), 0);
}

#[test]
fn test_ping_answered_with_pong() {
    let replies = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = Dispatcher::new();
    {
        let replies = replies.clone();
        dispatcher
            .on::<PingReq, _>(move |req| {
                assert_eq!(req.ping, PING);
                replies
                    .lock()
                    .unwrap()
                    .push(PingRes::default().encode()?);
                Ok(())
            })
            .unwrap();
    }

    dispatcher
        .dispatch(&Envelope::from_frame(&PingReq::default().encode().unwrap()))
        .unwrap();

    let replies = replies.lock().unwrap();
    assert_eq!(replies.len(), 1);
    let decoded = Message::decode(PACKET_ID_PING_RES, &replies[0][5..]).unwrap();
    assert_eq!(decoded, Message::PingRes(PingRes { pong: PONG }));
}

#[test]
fn test_handler_error_does_not_poison_dispatcher() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(PACKET_ID_LOGIN_RES, |_| {
            Err(ProtocolError::Custom("rejected".to_string()))
        })
        .unwrap();
    dispatcher.on::<PingRes, _>(|_| Ok(())).unwrap();

    let login = LoginRes::default().encode().unwrap();
    assert!(dispatcher.dispatch(&Envelope::from_frame(&login)).is_err());

    let pong = PingRes::default().encode().unwrap();
    assert!(dispatcher.dispatch(&Envelope::from_frame(&pong)).is_ok());
}
