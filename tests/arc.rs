// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use lazy_static::lazy_static;
use std::sync::Mutex;

use yangtools::*;

// Ensure that reactors and models can be shared across threads.
lazy_static! {
    static ref REACTOR: Mutex<Reactor> = Mutex::new(Reactor::new());
}

#[cfg(feature = "arc")]
fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_reactor() -> anyhow::Result<()> {
    let r_guard = REACTOR.lock();
    let mut reactor = r_guard.expect("failed to lock reactor");

    reactor.add_source(
        "foo.yang".to_string(),
        r#"
module foo {
  namespace "urn:foo";
  prefix foo;
  container c {
    leaf x { type string; }
  }
}
"#
        .to_string(),
    )?;

    let model = reactor.build()?;
    assert!(model.find_path("/foo:c/foo:x").is_some());
    Ok(())
}

#[cfg(feature = "arc")]
#[test]
fn model_is_send_and_sync() {
    assert_send_sync::<Reactor>();
    assert_send_sync::<EffectiveModel>();
}
