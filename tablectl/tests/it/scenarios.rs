use std::sync::Arc;

use tablectl::{
    Action, ControllerOptions, Error, Response, TableController, UidMarkMap, BASE_TABLE_NUMBER,
    IFNAMSIZ, INTERFACES_TRACKED,
};
use tablectl_exec::Recorder;

fn controller() -> (Arc<Recorder>, TableController<Arc<Recorder>>) {
    let _ = tracing_subscriber::fmt::try_init();
    let recorder = Arc::new(Recorder::new());
    let ctl = TableController::new(Arc::clone(&recorder));
    (recorder, ctl)
}

#[test]
fn ipv6_uplink_lifecycle() {
    let (recorder, mut ctl) = controller();

    ctl.add_route("wlan0", "2001:db8::", 64, "::").unwrap();
    assert_eq!(ctl.table_for("wlan0"), Some(BASE_TABLE_NUMBER));
    assert_eq!(ctl.slots().get(0).unwrap().rule_count(), 1);
    assert_eq!(recorder.take(), vec!["ip route add 2001:db8::/64 dev wlan0 table 60"]);

    ctl.remove_route("wlan0", "2001:db8::", 64, "::").unwrap();
    assert_eq!(recorder.take(), vec!["ip route del 2001:db8::/64 dev wlan0 table 60"]);
    assert_eq!(ctl.table_for("wlan0"), None);
    assert_eq!(ctl.slots().occupied().count(), 0);
}

#[test]
fn tethering_upstream() {
    let (recorder, mut ctl) = controller();

    // Upstream provisioning: default route, own address, source rule and fwmark.
    ctl.add_route("rmnet0", "0.0.0.0", 0, "10.64.64.64").unwrap();
    let index = ctl.slot_index("rmnet0").unwrap();
    ctl.modify_local_route(index, Action::Add, "rmnet0", "10.64.0.2").unwrap();
    ctl.modify_from_rule(index, Action::Add, "10.64.0.2").unwrap();
    ctl.add_fwmark_rule("rmnet0").unwrap();
    ctl.add_uid_rule("rmnet0", 10_000, 10_999).unwrap();
    assert_eq!(ctl.slots().get(index).unwrap().rule_count(), 4);

    assert_eq!(
        recorder.take(),
        vec![
            "ip route add 0.0.0.0/0 via 10.64.64.64 dev rmnet0 table 60",
            "ip route add 10.64.0.2 dev rmnet0 table 60",
            "ip -4 rule add from 10.64.0.2 table 60",
            "ip rule add fwmark 60 table 60",
            "iptables -t nat -A st_nat_POSTROUTING -o rmnet0 -m mark --mark 60 -j MASQUERADE",
            "iptables -t mangle -A st_mangle_OUTPUT -m owner --uid-owner 10000-10999 -j MARK --set-mark 60",
            "ip6tables -t mangle -A st_mangle_OUTPUT -m owner --uid-owner 10000-10999 -j MARK --set-mark 60",
        ]
    );

    // Interface drops: every removal of its kernel state now fails.
    recorder.fail_on(&["dev", "rmnet0"]);
    ctl.remove_uid_rule("rmnet0", 10_000, 10_999).unwrap();
    ctl.remove_fwmark_rule("rmnet0").unwrap();
    ctl.modify_from_rule(index, Action::Del, "10.64.0.2").unwrap();
    assert!(ctl.modify_local_route(index, Action::Del, "rmnet0", "10.64.0.2").is_err());
    assert_eq!(ctl.slots().get(index).unwrap().rule_count(), 1);

    assert!(ctl.remove_route("rmnet0", "0.0.0.0", 0, "10.64.64.64").is_err());
    assert_eq!(ctl.table_for("rmnet0"), Some(BASE_TABLE_NUMBER));

    recorder.clear_failures();
    ctl.remove_route("rmnet0", "0.0.0.0", 0, "10.64.64.64").unwrap();
    assert_eq!(ctl.table_for("rmnet0"), None);
    assert!(ctl.uid_marks().is_empty());
}

#[test]
fn pool_exhaustion_keeps_existing_tables() {
    let (recorder, mut ctl) = controller();

    for i in 0..INTERFACES_TRACKED {
        ctl.add_route(&format!("wlan{i}"), "10.0.0.0", 8, "::").unwrap();
    }
    recorder.take();

    assert!(matches!(ctl.add_route("wlan10", "10.0.0.0", 8, "::"), Err(Error::CapacityExceeded)));
    assert!(matches!(ctl.add_fwmark_rule("wlan10"), Err(Error::CapacityExceeded)));
    assert!(recorder.is_empty());

    for i in 0..INTERFACES_TRACKED {
        assert_eq!(ctl.table_for(&format!("wlan{i}")), Some(BASE_TABLE_NUMBER + i as u32));
    }

    // Releasing one table frees exactly that slot for the next interface.
    ctl.remove_route("wlan4", "10.0.0.0", 8, "::").unwrap();
    ctl.add_fwmark_rule("wlan10").unwrap();
    assert_eq!(ctl.table_for("wlan10"), Some(BASE_TABLE_NUMBER + 4));
}

#[test]
fn prefix_names_do_not_collide() {
    let (_recorder, mut ctl) = controller();

    ctl.add_route("eth0", "10.0.0.0", 8, "::").unwrap();
    assert_eq!(ctl.slot_index("eth"), None);
    let res = ctl.remove_route("eth", "10.0.0.0", 8, "::");
    assert!(matches!(res, Err(Error::InterfaceNotFound(_))));

    ctl.add_route("eth", "10.0.0.0", 8, "::").unwrap();
    assert_eq!(ctl.table_for("eth0"), Some(BASE_TABLE_NUMBER));
    assert_eq!(ctl.table_for("eth"), Some(BASE_TABLE_NUMBER + 1));
}

#[test]
fn uid_rule_without_add_is_invalid() {
    let (recorder, mut ctl) = controller();
    ctl.add_route("wlan0", "10.0.0.0", 8, "::").unwrap();
    recorder.take();

    let res = ctl.remove_uid_rule("wlan0", 1000, 1000);
    assert!(matches!(res, Err(Error::InvalidArgument(_))));
    assert_eq!(Response::from_result(&res, "").code.as_u16(), 501);
    assert!(recorder.is_empty());
}

#[test]
fn custom_base_table() {
    let _ = tracing_subscriber::fmt::try_init();
    let recorder = Arc::new(Recorder::new());
    let options = ControllerOptions::default().with_base_table(200).with_ip_path("/sbin/ip");
    let mut ctl =
        TableController::with_options(Arc::clone(&recorder), UidMarkMap::new(), options).unwrap();

    ctl.add_fwmark_rule("usb0").unwrap();
    ctl.add_route("usb0", "192.168.42.0", 24, "::").unwrap();

    let commands = recorder.commands();
    assert_eq!(commands[0], "/sbin/ip rule add fwmark 200 table 200");
    assert_eq!(commands[2], "/sbin/ip route add 192.168.42.0/24 dev usb0 table 200");
}

#[test]
fn responses_for_route_commands() {
    let (recorder, mut ctl) = controller();

    let res = ctl.add_route("wlan0", "10.0.0.0", 8, "::");
    assert_eq!(Response::from_result(&res, "Route modified").to_string(), "200 Route modified");

    let res = ctl.remove_route("p2p0", "10.0.0.0", 8, "::");
    assert_eq!(Response::from_result(&res, "Route modified").to_string(), "400 Interface not found");

    recorder.fail_on(&["route"]);
    let res = ctl.remove_route("wlan0", "10.0.0.0", 8, "::");
    assert_eq!(
        Response::from_result(&res, "Route modified").to_string(),
        "400 ip route modification failed"
    );
}

#[test]
fn long_names_sharing_a_prefix_stay_apart() {
    let (recorder, mut ctl) = controller();
    let exact = "rmnet_data_ipa00";
    assert_eq!(exact.len(), IFNAMSIZ);

    ctl.add_route(exact, "10.0.0.0", 8, "::").unwrap();
    recorder.take();

    // Both names start with the 16 bytes of `exact`.
    let longer = "rmnet_data_ipa00A";
    assert_eq!(ctl.table_for(longer), None);
    let res = ctl.add_route(longer, "10.0.0.0", 8, "::");
    assert!(matches!(res, Err(Error::InvalidArgument(_))));
    let res = ctl.remove_route(longer, "10.0.0.0", 8, "::");
    assert!(matches!(res, Err(Error::InterfaceNotFound(_))));
    let res = ctl.add_fwmark_rule("rmnet_data_ipa00B");
    assert!(matches!(res, Err(Error::InvalidArgument(_))));

    assert!(recorder.is_empty());
    assert_eq!(ctl.table_for(exact), Some(BASE_TABLE_NUMBER));
    assert_eq!(ctl.slots().get(0).unwrap().rule_count(), 1);
    assert_eq!(ctl.slots().occupied().count(), 1);
}
