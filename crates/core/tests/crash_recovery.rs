//! Power-loss recovery scenarios
//!
//! Each test interrupts the store at a commit point of a reclaim, reboots
//! (restores power and runs `initialize`), then checks that exactly one block
//! is active and every key reads back a value it was legitimately given.

use canpower_core::eeprom::{
    BlockStatus, EepromConfig, EepromEmulation, MockBlockDevice, RecoveryActions, WriteOutcome,
    ERASED_WORD,
};

/// Three blocks of seven slots
type Device = MockBlockDevice<3, 8>;

const CAPACITY: u8 = 4;

/// No proactive pack at boot, so recovery's block selection stays observable
fn config() -> EepromConfig {
    EepromConfig::new(CAPACITY, 3, 0)
}

fn boot(device: Device) -> EepromEmulation<Device> {
    let mut eeprom = EepromEmulation::new(device, config()).unwrap();
    eeprom.initialize().unwrap();
    eeprom
}

fn reboot(eeprom: EepromEmulation<Device>) -> (EepromEmulation<Device>, RecoveryActions) {
    let mut device = eeprom.into_inner();
    device.restore_power();
    let mut eeprom = EepromEmulation::new(device, config()).unwrap();
    let report = eeprom.initialize().unwrap();
    (eeprom, report.actions)
}

fn active_blocks(eeprom: &mut EepromEmulation<Device>) -> Vec<u8> {
    (0..3)
        .filter(|&block| eeprom.block_header(block).unwrap().status == BlockStatus::Active)
        .collect()
}

/// Active block completely full; keys 0 and 1 live, key 2 never written
fn full_store() -> EepromEmulation<Device> {
    let mut eeprom = boot(Device::new());
    for i in 0..7u16 {
        eeprom.write((i % 2) as u8, 100 + i).unwrap();
    }
    let active = eeprom.find_active().unwrap().unwrap();
    assert_eq!(eeprom.free_slots(active).unwrap(), 0);
    eeprom
}

const KEY0: u16 = 106;
const KEY1: u16 = 105;

/// Mutations of a write that packs two live records:
/// erase next, 2 record programs, header commit, erase old, append
const PACKING_WRITE_MUTATIONS: u32 = 6;

#[test]
fn crash_before_header_commit_keeps_old_block() {
    let mut eeprom = full_store();

    // erase + 2 records succeed, header commit is lost
    eeprom.device_mut().power_loss_after(3);
    assert!(eeprom.write(2, 0x2222).is_err());

    let (mut eeprom, actions) = reboot(eeprom);
    assert_eq!(actions, RecoveryActions::empty());
    assert_eq!(active_blocks(&mut eeprom), vec![0]);
    assert_eq!(eeprom.read(0).unwrap(), KEY0);
    assert_eq!(eeprom.read(1).unwrap(), KEY1);
    assert_eq!(eeprom.read(2).unwrap(), ERASED_WORD);

    // the half-filled block is reused by the next pack
    let outcome = eeprom.write(2, 0x2222).unwrap();
    assert!(matches!(
        outcome,
        WriteOutcome::Appended {
            block: 1,
            reclaimed: true,
            ..
        }
    ));
    assert_eq!(eeprom.read(2).unwrap(), 0x2222);
    assert_eq!(eeprom.read(0).unwrap(), KEY0);
}

#[test]
fn crash_after_header_commit_resolves_two_active_blocks() {
    let mut eeprom = full_store();

    // header commit lands, erase of the old block is lost
    eeprom.device_mut().power_loss_after(4);
    assert!(eeprom.write(2, 0x2222).is_err());

    let mut device = eeprom.into_inner();
    device.restore_power();
    let mut eeprom = EepromEmulation::new(device, config()).unwrap();
    assert_eq!(active_blocks(&mut eeprom), vec![0, 1]);

    let (mut eeprom, actions) = reboot(eeprom);
    assert_eq!(actions, RecoveryActions::DUPLICATE_ACTIVE_ERASED);
    assert_eq!(active_blocks(&mut eeprom), vec![0]);
    assert_eq!(eeprom.read(0).unwrap(), KEY0);
    assert_eq!(eeprom.read(1).unwrap(), KEY1);
    assert_eq!(eeprom.read(2).unwrap(), ERASED_WORD);
}

#[test]
fn crash_after_wrapping_commit_keeps_new_block_zero() {
    let mut eeprom = boot(Device::new());
    eeprom.reclaim().unwrap();
    eeprom.reclaim().unwrap();
    assert_eq!(eeprom.find_active().unwrap(), Some(2));

    for i in 0..7u16 {
        eeprom.write((i % 2) as u8, 100 + i).unwrap();
    }

    // pack 2 -> 0 commits, erase of block 2 is lost
    eeprom.device_mut().power_loss_after(4);
    assert!(eeprom.write(3, 0x3333).is_err());

    let (mut eeprom, actions) = reboot(eeprom);
    assert_eq!(actions, RecoveryActions::DUPLICATE_ACTIVE_ERASED);
    assert_eq!(active_blocks(&mut eeprom), vec![0]);
    assert_eq!(eeprom.reclaim_count().unwrap(), Some(1));
    assert_eq!(eeprom.read(0).unwrap(), KEY0);
    assert_eq!(eeprom.read(1).unwrap(), KEY1);
    assert_eq!(eeprom.free_slots(0).unwrap(), 5);
}

#[test]
fn fresh_pool_bootstraps_block_zero() {
    let mut eeprom = EepromEmulation::new(Device::new(), config()).unwrap();
    let report = eeprom.initialize().unwrap();

    assert_eq!(report.active, 0);
    assert_eq!(report.actions, RecoveryActions::BOOTSTRAPPED);
    assert_eq!(active_blocks(&mut eeprom), vec![0]);
    assert_eq!(eeprom.reclaim_count().unwrap(), Some(0));
    for key in 0..=CAPACITY {
        assert_eq!(eeprom.read(key).unwrap(), ERASED_WORD);
    }
}

#[test]
fn writes_beyond_one_block_reclaim_exactly_once() {
    // 8 keys, blocks of 9 slots
    let config = EepromConfig::new(8, 2, 1);
    let mut eeprom = EepromEmulation::new(MockBlockDevice::<2, 10>::new(), config).unwrap();
    eeprom.initialize().unwrap();

    let mut writes = Vec::new();
    for key in 0..4u8 {
        writes.push((key, 0x0100 + key as u16));
    }
    for key in 0..4u8 {
        writes.push((key, 0x0200 + key as u16));
    }
    for key in 4..7u8 {
        writes.push((key, 0x0300 + key as u16));
    }

    let mut reclaims = 0;
    for &(key, value) in &writes {
        match eeprom.write(key, value).unwrap() {
            WriteOutcome::Appended { reclaimed, .. } => reclaims += reclaimed as u32,
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(reclaims, 1);
    assert_eq!(eeprom.find_active().unwrap(), Some(1));
    for key in 0..4u8 {
        assert_eq!(eeprom.read(key).unwrap(), 0x0200 + key as u16);
    }
    for key in 4..7u8 {
        assert_eq!(eeprom.read(key).unwrap(), 0x0300 + key as u16);
    }
    assert_eq!(eeprom.read(7).unwrap(), ERASED_WORD);
}

#[test]
fn crash_at_every_mutation_of_a_packing_write_recovers() {
    let baseline = full_store().into_inner();

    for crash_at in 0..=PACKING_WRITE_MUTATIONS {
        let mut device = baseline.clone();
        device.power_loss_after(crash_at);
        let mut eeprom = EepromEmulation::new(device, config()).unwrap();
        let completed = eeprom.write(2, 0x2222).is_ok();
        assert_eq!(completed, crash_at == PACKING_WRITE_MUTATIONS, "crash at {}", crash_at);

        let (mut eeprom, _) = reboot(eeprom);
        assert_eq!(active_blocks(&mut eeprom).len(), 1, "crash at {}", crash_at);
        assert_eq!(eeprom.read(0).unwrap(), KEY0, "crash at {}", crash_at);
        assert_eq!(eeprom.read(1).unwrap(), KEY1, "crash at {}", crash_at);

        let key2 = eeprom.read(2).unwrap();
        assert!(key2 == ERASED_WORD || key2 == 0x2222, "crash at {}", crash_at);

        // the store keeps working after recovery
        eeprom.write(3, 0x3333).unwrap();
        assert_eq!(eeprom.read(3).unwrap(), 0x3333, "crash at {}", crash_at);
    }
}

#[test]
fn boot_pack_after_interrupted_reclaim() {
    let eeprom = full_store();
    let mut device = eeprom.into_inner();
    device.power_loss_after(3);
    let mut eeprom = EepromEmulation::new(device, config()).unwrap();
    assert!(eeprom.reclaim().is_err());

    // reboot with a threshold that forces the full block to be packed
    let mut device = eeprom.into_inner();
    device.restore_power();
    let mut eeprom = EepromEmulation::new(device, EepromConfig::new(CAPACITY, 3, 1)).unwrap();
    let report = eeprom.initialize().unwrap();

    assert_eq!(report.actions, RecoveryActions::PACKED);
    assert_eq!(report.active, 1);
    assert_eq!(active_blocks(&mut eeprom), vec![1]);
    assert_eq!(eeprom.read(0).unwrap(), KEY0);
    assert_eq!(eeprom.read(1).unwrap(), KEY1);
    assert_eq!(eeprom.free_slots(1).unwrap(), 5);
}
