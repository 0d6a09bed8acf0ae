#![cfg(feature = "epd2in9")]

mod common;

use common::{BusyPin, DcPin, FakeSpi, RstPin, Shared, POLL_US};
use epd_refresh::epd2in9::{self, Epd2in9};
use epd_refresh::prelude::*;

type Driver = Epd2in9<FakeSpi, BusyPin, DcPin, RstPin>;

fn landscape() -> PanelGeometry {
    PanelGeometry::new(epd2in9::WIDTH, epd2in9::HEIGHT, DisplayRotation::Rotate270)
}

#[tokio::test]
async fn landscape_label_update() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let (busy, dc, rst) = bus.pins();
    let mut epd: Driver = Epd2in9::new(busy, dc, rst, Some(POLL_US));
    let mut shadow = vec![0u8; buffer_len(128, 296)];
    let scheduler = RefreshScheduler::new(epd2in9::PROFILE.full_refresh_interval);
    let mut bridge = FlushBridge::new(&mut epd, landscape(), scheduler, &mut shadow).unwrap();

    // an 8x8 black square in the logical top left corner
    let area = Area::new(0, 0, 8, 8);
    let pixels = [0xFF; 8];

    let outcome = bridge.flush(&mut spi, area, &pixels, 1, |_| {}).await;
    assert!(matches!(outcome, Ok(FlushOutcome::Full)));
    let frames = bus.data_of(0x24);
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.len() == 4_736));
    assert_eq!(bus.data_of(0x22).last(), Some(&vec![0xC7]));
    bus.take();

    let outcome = bridge.flush(&mut spi, area, &pixels, 1, |_| {}).await;
    let window = RefreshWindow {
        x: 0,
        y: 288,
        w: 8,
        h: 8,
    };
    assert!(matches!(outcome, Ok(FlushOutcome::Partial(w)) if w == window));
    assert_eq!(bus.data_of(0x44)[0], vec![0x00, 0x00]);
    assert_eq!(bus.data_of(0x45)[0], vec![0x20, 0x01, 0x27, 0x01]);
    assert_eq!(bus.data_of(0x24), vec![vec![0x00; 8]; 3]);
    assert_eq!(bus.data_of(0x22), vec![vec![0xC0], vec![0x04]]);
    assert_eq!(bus.count(0x32), 1);

    let state = bridge.panel().state();
    assert!(state.using_partial_mode);
    assert!(state.power_on);
    assert_eq!(bridge.scheduler().partial_count(), 1);
}

#[tokio::test]
async fn hibernated_panel_wakes_up_on_flush() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let (busy, dc, rst) = bus.pins();
    let mut epd: Driver = Epd2in9::new(busy, dc, rst, Some(POLL_US));
    let mut shadow = vec![0u8; buffer_len(128, 296)];
    let mut bridge =
        FlushBridge::new(&mut epd, landscape(), RefreshScheduler::new(32), &mut shadow).unwrap();

    bridge.clear(&mut spi, Color::White).await.unwrap();
    bridge.hibernate(&mut spi).await.unwrap();
    assert!(bridge.panel().state().hibernating);
    bus.take();

    let outcome = bridge
        .flush(&mut spi, Area::new(100, 40, 16, 1), &[0xFF, 0xFF], 2, |_| {})
        .await;
    assert!(matches!(outcome, Ok(FlushOutcome::Partial(_))));
    assert_eq!(bus.resets(), 1);
    assert!(!bridge.panel().state().hibernating);
}

#[tokio::test]
async fn busy_timeout_surfaces_through_the_bridge() {
    let bus = Shared::new();
    let mut spi = bus.spi();
    let (busy, dc, rst) = bus.pins();
    let profile = PanelProfile {
        busy_timeouts: BusyTimeouts {
            init_ms: 2,
            power_on_ms: 2,
            power_off_ms: 2,
            full_refresh_ms: 2,
            partial_refresh_ms: 2,
        },
        ..epd2in9::PROFILE
    };
    let mut epd: Driver = Epd2in9::with_profile(busy, dc, rst, Some(POLL_US), profile);
    let mut shadow = vec![0u8; buffer_len(128, 296)];
    let mut bridge =
        FlushBridge::new(&mut epd, landscape(), RefreshScheduler::new(32), &mut shadow).unwrap();

    bus.set_stuck(true);
    let mut seen = None;
    let outcome = bridge
        .flush(&mut spi, Area::new(0, 0, 8, 1), &[0xFF], 1, |result| {
            seen = Some(result.is_err());
        })
        .await;

    assert!(matches!(
        outcome,
        Err(FlushError::Panel(ErrorKind::BusyTimeout(BusyOp::Init)))
    ));
    assert_eq!(seen, Some(true));
    assert!(bridge.scheduler().force_full_pending());
}
