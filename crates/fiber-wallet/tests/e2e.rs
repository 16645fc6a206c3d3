//! End-to-end wallet lifecycle tests.
//!
//! Each test drives a registry backed by a temp directory through create,
//! derive, reload, recover and remove, checking both the in-memory view and
//! what lands on disk.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier};

use fiber_wallet::{make_wallet_id, store, KdfParams, RegistryConfig, WalletError, WalletRegistry};

const PW: &str = "e2e-password";

fn open(dir: &Path) -> WalletRegistry {
    let config = RegistryConfig {
        kdf: KdfParams::testing(),
        ..RegistryConfig::with_dir(dir)
    };
    WalletRegistry::init(config, PW).unwrap()
}

#[test]
fn lifecycle_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let (id, addresses) = {
        let reg = open(tmp.path());
        let id = reg.create_wallet("samos", "savings", Some("lifecycle seed"), PW).unwrap();
        reg.new_addresses(&id, 4, PW).unwrap();
        reg.update_label(&id, "cold storage").unwrap();
        (id.clone(), reg.get_addresses(&id).unwrap())
    };
    assert_eq!(addresses.len(), 5);

    let reg = open(tmp.path());
    assert_eq!(reg.wallet_ids(), vec![id.clone()]);
    assert_eq!(reg.get_addresses(&id).unwrap(), addresses);
    let wallet = reg.wallet(&id).unwrap();
    assert_eq!(wallet.label(), "cold storage");
    assert_eq!(wallet.coin_type(), "samos");
    assert!(wallet.is_locked());

    // Derivation continues from the persisted chain state.
    let more = reg.new_addresses(&id, 1, PW).unwrap();
    assert!(!addresses.contains(&more[0]));
}

#[test]
fn keypair_identical_after_reload() {
    let tmp = tempfile::tempdir().unwrap();
    let seed = "abcd 1234 river orbit lamp forest quiet mirror copper olive at";
    let (id, addresses, public, secret) = {
        let reg = open(tmp.path());
        let id = reg.create_wallet("skycoin", "keys", Some(seed), PW).unwrap();
        reg.new_addresses(&id, 2, PW).unwrap();
        let addresses = reg.get_addresses(&id).unwrap();
        let kp = reg.get_keypair(&id, &addresses[0], PW).unwrap();
        (id, addresses, kp.public_key(), kp.secret_key().to_hex())
    };
    assert_eq!(addresses.len(), 3);

    let reg = open(tmp.path());
    assert_eq!(reg.get_addresses(&id).unwrap(), addresses);
    let kp = reg.get_keypair(&id, &addresses[0], PW).unwrap();
    assert_eq!(kp.public_key(), public);
    assert_eq!(kp.secret_key().to_hex(), secret);
    assert_eq!(kp.address(), addresses[0]);
}

#[test]
fn same_seed_recovers_same_addresses() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let reg = open(first.path());
    let id = reg.create_wallet("skycoin", "original", None, PW).unwrap();
    reg.new_addresses(&id, 2, PW).unwrap();
    let seed = reg.get_seed(&id, PW).unwrap();

    let restored = open(second.path());
    let restored_id = restored.create_wallet("skycoin", "restored", Some(seed.as_str()), PW).unwrap();
    restored.new_addresses(&restored_id, 2, PW).unwrap();

    assert_eq!(restored_id, id);
    assert_eq!(restored_id, make_wallet_id("skycoin", &seed));
    assert_eq!(
        restored.get_addresses(&restored_id).unwrap(),
        reg.get_addresses(&id).unwrap()
    );
}

#[test]
fn wallet_file_holds_no_plaintext_secrets() {
    let tmp = tempfile::tempdir().unwrap();
    let seed = "plaintext canary seed words";
    let reg = open(tmp.path());
    let id = reg.create_wallet("skycoin", "main", Some(seed), PW).unwrap();
    reg.new_addresses(&id, 2, PW).unwrap();

    let contents = fs::read_to_string(store::wallet_path(tmp.path(), &id)).unwrap();
    assert!(!contents.contains(seed));
    for address in reg.get_addresses(&id).unwrap() {
        assert!(contents.contains(&address.to_string()));
        let secret = reg.get_keypair(&id, &address, PW).unwrap().secret_key().to_hex();
        assert!(!contents.contains(&secret));
    }
}

#[test]
fn store_password_is_shared() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let reg = open(tmp.path());
        reg.create_wallet("skycoin", "a", Some("shared one"), PW).unwrap();
        reg.create_wallet("mdl", "b", Some("shared two"), PW).unwrap();
        assert_eq!(
            reg.create_wallet("spo", "c", Some("shared three"), "different").unwrap_err(),
            WalletError::WrongPassword
        );
    }

    let config = RegistryConfig {
        kdf: KdfParams::testing(),
        ..RegistryConfig::with_dir(tmp.path())
    };
    let err = WalletRegistry::init(config, "different").unwrap_err();
    assert_eq!(err, WalletError::WrongPassword);
    assert_eq!(open(tmp.path()).wallet_ids().len(), 2);
}

#[test]
fn removed_wallet_stays_removed() {
    let tmp = tempfile::tempdir().unwrap();
    let reg = open(tmp.path());
    let keep = reg.create_wallet("skycoin", "keep", Some("keep me"), PW).unwrap();
    let drop = reg.create_wallet("skycoin", "drop", Some("drop me"), PW).unwrap();
    reg.remove(&drop).unwrap();

    let reg = open(tmp.path());
    assert_eq!(reg.wallet_ids(), vec![keep]);
    assert!(!reg.is_exist(&drop));
}

#[test]
fn parallel_creation_of_distinct_wallets() {
    let tmp = tempfile::tempdir().unwrap();
    let reg = Arc::new(open(tmp.path()));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let reg = Arc::clone(&reg);
            std::thread::spawn(move || {
                let id = reg
                    .create_wallet("skycoin", &format!("w{i}"), Some(format!("parallel {i}").as_str()), PW)
                    .unwrap();
                reg.new_addresses(&id, 2, PW).unwrap();
                id
            })
        })
        .collect();
    let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort();

    assert_eq!(reg.wallet_ids(), ids);
    let reloaded = open(tmp.path());
    assert_eq!(reloaded.wallet_ids(), ids);
    for id in &ids {
        assert_eq!(reloaded.get_addresses(id).unwrap().len(), 3);
    }
}

#[test]
fn racing_duplicate_creation_admits_one() {
    let tmp = tempfile::tempdir().unwrap();
    let reg = Arc::new(open(tmp.path()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reg = Arc::clone(&reg);
            std::thread::spawn(move || reg.create_wallet("skycoin", "same", Some("same seed"), PW))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, WalletError::DuplicateWallet(_))));
    assert_eq!(reg.wallet_ids().len(), 1);
}

#[test]
fn racing_creation_with_other_password_is_refused() {
    for round in 0..10 {
        let tmp = tempfile::tempdir().unwrap();
        let reg = Arc::new(open(tmp.path()));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [PW, "intruder-pw"]
            .into_iter()
            .map(|password| {
                let reg = Arc::clone(&reg);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let seed = format!("race {round} {password}");
                    reg.create_wallet("skycoin", "race", Some(seed.as_str()), password)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(results[0].is_ok(), "round {round}: {:?}", results[0]);
        assert_eq!(results[1], Err(WalletError::WrongPassword), "round {round}");
        assert_eq!(open(tmp.path()).wallet_ids().len(), 1);
    }
}
