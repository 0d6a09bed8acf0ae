#![cfg(feature = "epd2in9")]

mod common;

use common::{BusyPin, DcPin, FakeSpi, RstPin, Shared, Wire, POLL_US};
use epd_refresh::epd2in9::{Epd2in9, PROFILE};
use epd_refresh::error::Misuse;
use epd_refresh::prelude::*;

type Driver = Epd2in9<FakeSpi, BusyPin, DcPin, RstPin>;

fn driver(bus: &Shared) -> Driver {
    let (busy, dc, rst) = bus.pins();
    Epd2in9::new(busy, dc, rst, Some(POLL_US))
}

fn window(x: u32, y: u32, w: u32, h: u32) -> RefreshWindow {
    RefreshWindow { x, y, w, h }
}

async fn write_current(epd: &mut Driver, spi: &mut FakeSpi, w: RefreshWindow) {
    let bytes = vec![0xAA; w.byte_len()];
    epd.set_window(spi, w).await.unwrap();
    epd.write_buffer(spi, RamPlane::Current, &bytes)
        .await
        .unwrap();
}

#[tokio::test]
async fn init_sequence() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);

    epd.init(&mut spi).await.unwrap();
    epd.init(&mut spi).await.unwrap();

    assert_eq!(
        bus.take(),
        vec![
            Wire::Reset,
            Wire::Command(0x01),
            Wire::Data(vec![0x27, 0x01, 0x00]),
            Wire::Command(0x0C),
            Wire::Data(vec![0xD7, 0xD6, 0x9D]),
            Wire::Command(0x2C),
            Wire::Data(vec![0xA8]),
            Wire::Command(0x3A),
            Wire::Data(vec![0x1A]),
            Wire::Command(0x3B),
            Wire::Data(vec![0x08]),
            Wire::Command(0x11),
            Wire::Data(vec![0x03]),
            Wire::Command(0x44),
            Wire::Data(vec![0x00, 0x0F]),
            Wire::Command(0x45),
            Wire::Data(vec![0x00, 0x00, 0x27, 0x01]),
            Wire::Command(0x4E),
            Wire::Data(vec![0x00]),
            Wire::Command(0x4F),
            Wire::Data(vec![0x00, 0x00]),
        ]
    );
}

#[tokio::test]
async fn full_refresh_uploads_the_full_waveform() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);
    epd.init(&mut spi).await.unwrap();
    bus.take();

    // no fast waveform on this controller
    epd.update_full(&mut spi, true).await.unwrap();

    let luts = bus.data_of(0x32);
    assert_eq!(luts.len(), 1);
    assert_eq!(luts[0].len(), 30);
    assert_eq!(&luts[0][..4], &[0x02, 0x02, 0x01, 0x11]);
    assert_eq!(bus.data_of(0x22), vec![vec![0xC0], vec![0xC7]]);
    assert!(bus.commands().ends_with(&[0x22, 0x20, 0xFF]));

    let state = epd.state();
    assert!(!state.using_fast_full_update);
    assert!(!state.power_on);
    assert!(!state.initial_refresh);

    // the register still holds the full waveform
    bus.take();
    epd.update_full(&mut spi, false).await.unwrap();
    assert_eq!(bus.count(0x32), 0);
}

#[tokio::test]
async fn partial_refresh_keeps_the_panel_powered() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);
    let w = window(8, 100, 16, 20);
    epd.clear_screen(&mut spi, Color::White).await.unwrap();
    bus.take();

    for _ in 0..2 {
        write_current(&mut epd, &mut spi, w).await;
        epd.update_partial(&mut spi, w).await.unwrap();
    }

    let luts = bus.data_of(0x32);
    assert_eq!(luts.len(), 1);
    assert_eq!(&luts[0][..4], &[0x10, 0x18, 0x18, 0x08]);
    assert_eq!(bus.data_of(0x22), vec![vec![0xC0], vec![0x04], vec![0x04]]);
    assert!(epd.state().power_on);
    assert!(epd.state().using_partial_mode);

    // back to the full waveform
    bus.take();
    epd.update_full(&mut spi, false).await.unwrap();
    assert_eq!(&bus.data_of(0x32)[0][..4], &[0x02, 0x02, 0x01, 0x11]);
    assert!(!epd.state().partial_lut_loaded);
}

#[tokio::test]
async fn partial_lut_is_reloaded_after_power_off() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);
    let w = window(0, 0, 8, 8);
    epd.clear_screen(&mut spi, Color::White).await.unwrap();
    write_current(&mut epd, &mut spi, w).await;
    epd.update_partial(&mut spi, w).await.unwrap();

    epd.power_off(&mut spi).await.unwrap();
    assert_eq!(bus.data_of(0x22).last(), Some(&vec![0xC3]));
    bus.take();

    write_current(&mut epd, &mut spi, w).await;
    epd.update_partial(&mut spi, w).await.unwrap();
    assert_eq!(bus.count(0x32), 1);
}

#[tokio::test]
async fn both_planes_share_one_ram() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);
    let w = window(0, 0, 8, 2);
    epd.clear_screen(&mut spi, Color::White).await.unwrap();
    bus.take();

    epd.set_window(&mut spi, w).await.unwrap();
    epd.write_buffer(&mut spi, RamPlane::Previous, &[1, 2])
        .await
        .unwrap();
    epd.set_window(&mut spi, w).await.unwrap();
    epd.write_buffer(&mut spi, RamPlane::Current, &[3, 4])
        .await
        .unwrap();

    assert_eq!(bus.data_of(0x24), vec![vec![1, 2], vec![3, 4]]);
    assert_eq!(bus.count(0x26), 0);
}

#[tokio::test]
async fn first_window_write_fills_the_ram() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);

    write_current(&mut epd, &mut spi, window(8, 16, 8, 2)).await;

    assert_eq!(bus.data_of(0x24), vec![vec![0xFF; 4_736], vec![0xAA; 2]]);
    assert_eq!(bus.data_of(0x44).last(), Some(&vec![1, 1]));
    assert_eq!(bus.data_of(0x45).last(), Some(&vec![16, 0, 17, 0]));
    bus.take();

    // the RAM is defined now, even before the first refresh
    write_current(&mut epd, &mut spi, window(8, 16, 8, 2)).await;
    assert_eq!(bus.data_of(0x24), vec![vec![0xAA; 2]]);
}

#[tokio::test]
async fn full_window_write_needs_no_fill() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);

    write_current(&mut epd, &mut spi, window(0, 0, 128, 296)).await;

    assert_eq!(bus.data_of(0x24), vec![vec![0xAA; 4_736]]);
}

#[tokio::test]
async fn clear_screen_writes_both_banks() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);

    epd.clear_screen(&mut spi, Color::White).await.unwrap();

    let len = buffer_len(128, 296);
    assert_eq!(len, 4_736);
    assert_eq!(bus.data_of(0x24), vec![vec![0xFF; len], vec![0xFF; len]]);
    assert!(!epd.state().initial_refresh);
}

#[tokio::test]
async fn first_partial_is_promoted_to_full() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);
    let w = window(0, 0, 8, 1);

    write_current(&mut epd, &mut spi, w).await;
    epd.update_partial(&mut spi, w).await.unwrap();

    assert_eq!(bus.data_of(0x22).last(), Some(&vec![0xC7]));
    assert!(!epd.state().using_partial_mode);
}

#[tokio::test]
async fn partial_refresh_timeout() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let (busy, dc, rst) = bus.pins();
    let profile = PanelProfile {
        busy_timeouts: BusyTimeouts {
            partial_refresh_ms: 3,
            ..PROFILE.busy_timeouts
        },
        ..PROFILE
    };
    let mut epd: Driver = Epd2in9::with_profile(busy, dc, rst, Some(POLL_US), profile);
    let w = window(0, 0, 8, 1);
    epd.clear_screen(&mut spi, Color::White).await.unwrap();

    // power on, then the partial sequence
    bus.stuck_after_activations(2);
    write_current(&mut epd, &mut spi, w).await;
    let err = epd.update_partial(&mut spi, w).await.unwrap_err();

    assert!(matches!(
        err,
        ErrorKind::BusyTimeout(BusyOp::PartialRefresh)
    ));
    assert!(epd.state().power_on);
    // 3ms in 1ms steps, then the poll that gives up
    assert!(bus.polls() >= 4);
}

#[tokio::test]
async fn hibernate_after_a_busy_timeout_resets_on_init() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let (busy, dc, rst) = bus.pins();
    let profile = PanelProfile {
        busy_timeouts: BusyTimeouts {
            init_ms: 3,
            power_on_ms: 3,
            power_off_ms: 3,
            full_refresh_ms: 3,
            partial_refresh_ms: 3,
        },
        ..PROFILE
    };
    let mut epd: Driver = Epd2in9::with_profile(busy, dc, rst, Some(POLL_US), profile);
    epd.init(&mut spi).await.unwrap();
    bus.take();

    bus.set_stuck(true);
    let err = epd.update_full(&mut spi, false).await.unwrap_err();
    assert!(matches!(err, ErrorKind::BusyTimeout(BusyOp::PowerOn)));
    assert!(epd.state().power_on);

    let err = epd.hibernate(&mut spi).await.unwrap_err();
    assert!(matches!(err, ErrorKind::BusyTimeout(BusyOp::PowerOff)));
    assert_eq!(bus.data_of(0x22).last(), Some(&vec![0xC3]));
    assert_eq!(bus.data_of(0x10), vec![vec![0x01]]);
    assert!(epd.state().hibernating);
    assert!(!epd.state().power_on);

    bus.set_stuck(false);
    epd.init(&mut spi).await.unwrap();
    assert_eq!(bus.resets(), 1);
    assert!(epd.state().init_done);
}

#[tokio::test]
async fn misuse_is_reported() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);
    epd.clear_screen(&mut spi, Color::White).await.unwrap();

    let err = epd
        .write_buffer(&mut spi, RamPlane::Current, &[0])
        .await
        .unwrap_err();
    assert!(matches!(err, ErrorKind::ProtocolMisuse(Misuse::NoWindow)));

    let err = epd
        .set_window(&mut spi, window(120, 0, 16, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ErrorKind::ProtocolMisuse(Misuse::InvalidWindow)
    ));

    write_current(&mut epd, &mut spi, window(0, 0, 8, 1)).await;
    let err = epd
        .update_partial(&mut spi, window(0, 1, 8, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ErrorKind::ProtocolMisuse(Misuse::WindowNotWritten)
    ));
}

#[tokio::test]
async fn wake_up_reloads_everything() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let mut epd = driver(&bus);
    epd.clear_screen(&mut spi, Color::White).await.unwrap();

    epd.hibernate(&mut spi).await.unwrap();
    assert_eq!(bus.data_of(0x10), vec![vec![0x01]]);
    assert!(epd.state().hibernating);
    bus.take();

    epd.update_full(&mut spi, false).await.unwrap();
    assert_eq!(bus.resets(), 1);
    // the LUT register does not survive deep sleep
    assert_eq!(bus.count(0x32), 1);
}
