use rand::Rng;
use tablectl::{TableController, INTERFACES_TRACKED};
use tablectl_exec::Recorder;

const IFACES: [&str; 3] = ["wlan0", "rmnet0", "rmnet1"];

#[test]
fn rule_count_tracks_adds_minus_removes() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut rng = rand::thread_rng();

    for _ in 0..20 {
        let mut ctl = TableController::new(Recorder::new());
        let mut expected = [0u32; IFACES.len()];

        for _ in 0..200 {
            let which = rng.gen_range(0..IFACES.len());
            let iface = IFACES[which];

            if rng.gen_bool(0.55) {
                ctl.add_route(iface, "10.0.0.0", 8, "::").unwrap();
                expected[which] += 1;
            } else if expected[which] > 0 {
                ctl.remove_route(iface, "10.0.0.0", 8, "::").unwrap();
                expected[which] -= 1;
            } else {
                assert!(ctl.remove_route(iface, "10.0.0.0", 8, "::").is_err());
            }

            for (i, iface) in IFACES.iter().enumerate() {
                match ctl.slot_index(iface) {
                    Some(index) => {
                        assert_eq!(ctl.slots().get(index).unwrap().rule_count(), expected[i]);
                        assert!(expected[i] > 0);
                    }
                    None => assert_eq!(expected[i], 0),
                }
            }
        }
    }
}

#[test]
fn slots_never_hold_duplicate_or_dangling_names() {
    let mut rng = rand::thread_rng();
    let mut ctl = TableController::new(Recorder::new());
    ctl.executor().fail_on(&["10.9.0.0/16"]);

    for _ in 0..2000 {
        let iface = format!("tun{}", rng.gen_range(0..INTERFACES_TRACKED + 4));
        let dest = if rng.gen_bool(0.1) { "10.9.0.0" } else { "10.8.0.0" };

        let _ = match rng.gen_range(0..3) {
            0 => ctl.add_route(&iface, dest, 16, "::"),
            1 => ctl.remove_route(&iface, dest, 16, "::"),
            _ => match ctl.slot_index(&iface) {
                Some(index) => ctl.modify_from_rule(index, tablectl::Action::Add, "10.8.0.1"),
                None => Ok(()),
            },
        };

        let names: Vec<_> = ctl.slots().occupied().map(|(_, s)| s.name().to_string()).collect();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());

        for index in 0..INTERFACES_TRACKED {
            let slot = ctl.slots().get(index).unwrap();
            assert!(slot.is_occupied() || slot.rule_count() == 0);
            assert!(!slot.is_occupied() || slot.rule_count() > 0);
        }
    }
}
