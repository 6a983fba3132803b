use super::common::*;
use std::sync::Arc;

use crate::reviews::domain::EmployeeRecord;
use crate::reviews::hierarchy::{
    CandidatePicker, OrgHierarchyResolver, ResolverError, ThreadRngPicker,
};
use crate::reviews::memory::InMemoryOrganisation;

fn resolver(
    employees: Vec<EmployeeRecord>,
) -> OrgHierarchyResolver<InMemoryOrganisation, FirstPicker> {
    OrgHierarchyResolver::new(organisation(employees), Arc::new(FirstPicker))
}

fn in_division(number: &str, grade: &str, office: &str, division: &str) -> EmployeeRecord {
    EmployeeRecord {
        division_id: Some(unit(division)),
        ..employee(number, grade, office)
    }
}

fn in_department_only(number: &str, grade: &str, office: &str) -> EmployeeRecord {
    EmployeeRecord {
        division_id: Some(unit("DIV-OTHER")),
        ..employee(number, grade, office)
    }
}

#[test]
fn subordinates_come_from_the_office_first() {
    let subject = employee("S001", "07", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("E002", "09", "OFF-1"),
        employee("E003", "10", "OFF-2"),
    ]);

    let candidates = resolver
        .subordinate_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E002"]));
}

#[test]
fn subordinate_fallback_stops_at_the_division() {
    let subject = employee("S001", "07", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("E002", "05", "OFF-1"),
        in_division("E003", "09", "OFF-2", "DIV-TRS"),
        in_department_only("E004", "10", "OFF-3"),
    ]);

    let candidates = resolver
        .subordinate_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E003"]));
}

#[test]
fn subordinate_fallback_reaches_the_department() {
    let subject = employee("S001", "07", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("E002", "05", "OFF-1"),
        in_department_only("E004", "10", "OFF-3"),
        in_department_only("E005", "06", "OFF-3"),
    ]);

    let candidates = resolver
        .subordinate_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E004"]));
}

#[test]
fn subject_without_division_skips_that_level() {
    let subject = EmployeeRecord {
        division_id: None,
        ..employee("S001", "07", "OFF-1")
    };
    let resolver = resolver(vec![
        subject.clone(),
        in_department_only("E004", "10", "OFF-3"),
    ]);

    let candidates = resolver
        .subordinate_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E004"]));
}

#[test]
fn subordinate_filters_head_permanent_members_blanks_and_bad_grades() {
    let subject = EmployeeRecord {
        head_of_office: Some(id("H001")),
        ..employee("S001", "07", "OFF-1")
    };
    let valid = employee("E006", "08", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("H001", "09", "OFF-1"),
        employee("PM01", "41", "OFF-1"),
        employee("  ", "10", "OFF-1"),
        employee("E005", "GL-9", "OFF-1"),
        valid.clone(),
        valid,
    ]);

    let candidates = resolver
        .subordinate_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].employee_number, id("E006"));
}

#[test]
fn permanent_member_subordinates_are_below_grade_four() {
    let subject = employee("PM01", "41", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("E001", "03", "OFF-1"),
        employee("E002", "04", "OFF-1"),
        employee("E003", "05", "OFF-1"),
        employee("E004", "12", "OFF-1"),
        employee("PM02", "41", "OFF-1"),
    ]);

    let candidates = resolver
        .subordinate_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E003", "E004"]));
}

#[test]
fn permanent_member_superiors_are_above_grade_four() {
    let subject = employee("PM01", "41", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("E001", "02", "OFF-1"),
        employee("E002", "03", "OFF-1"),
        employee("E003", "04", "OFF-1"),
        employee("E004", "06", "OFF-1"),
        employee("PM02", "41", "OFF-1"),
    ]);

    let candidates = resolver
        .superior_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E001", "E002"]));
}

#[test]
fn permanent_member_has_no_peers() {
    let subject = employee("PM01", "41", "OFF-1");
    let resolver = resolver(vec![subject.clone(), employee("PM02", "41", "OFF-1")]);

    let selected = resolver.peer_for(&subject).expect("directory reachable");
    assert!(selected.is_none());
}

#[test]
fn permanent_members_are_never_subordinate_or_peer_candidates() {
    let subject = employee("S001", "07", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("PM01", "41", "OFF-1"),
        in_division("PM02", "41", "OFF-2", "DIV-TRS"),
        in_department_only("PM03", "41", "OFF-3"),
    ]);

    assert!(resolver
        .subordinate_candidates(&subject)
        .expect("directory reachable")
        .is_empty());
    assert!(resolver
        .peer_candidates(&subject)
        .expect("directory reachable")
        .is_empty());
}

#[test]
fn superior_excludes_supervisor_and_office_head() {
    let subject = EmployeeRecord {
        supervisor_id: Some(id("SUP1")),
        head_of_office: Some(id("HEAD")),
        ..employee("S001", "07", "OFF-1")
    };
    let resolver = resolver(vec![
        subject.clone(),
        employee("SUP1", "05", "OFF-1"),
        employee("HEAD", "03", "OFF-1"),
        employee("E004", "06", "OFF-1"),
        employee("E005", "08", "OFF-1"),
    ]);

    let candidates = resolver
        .superior_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E004"]));
}

#[test]
fn department_level_accepts_permanent_member_superior() {
    let subject = employee("S001", "07", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("E002", "09", "OFF-1"),
        in_department_only("PM01", "41", "OFF-9"),
    ]);

    let candidates = resolver
        .superior_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["PM01"]));
}

#[test]
fn office_level_never_accepts_permanent_member_superior() {
    let subject = EmployeeRecord {
        department_id: None,
        ..employee("S001", "07", "OFF-1")
    };
    let resolver = resolver(vec![subject.clone(), employee("PM01", "41", "OFF-1")]);

    assert!(resolver
        .superior_for(&subject)
        .expect("directory reachable")
        .is_none());
}

#[test]
fn peers_share_the_grade_and_fall_back_by_scope() {
    let subject = employee("S001", "07", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        employee("E002", "06", "OFF-1"),
        in_division("E003", "07", "OFF-2", "DIV-TRS"),
        in_department_only("E004", "07", "OFF-3"),
    ]);

    let candidates = resolver
        .peer_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E003"]));
}

#[test]
fn peers_need_the_same_grade_code_not_just_the_same_rank() {
    let subject = employee("S001", "07", "OFF-1");
    let resolver = resolver(vec![
        subject.clone(),
        in_division("E003", "7", "OFF-2", "DIV-TRS"),
        in_department_only("E004", " 07 ", "OFF-3"),
    ]);

    let candidates = resolver
        .peer_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["E004"]));
}

#[test]
fn governor_subordinates_are_reporting_department_heads() {
    let governor = EmployeeRecord {
        job_title: "Deputy Governor, Operations".to_string(),
        ..employee("GOV1", "41", "OFF-GOV")
    };
    let self_headed = |number: &str| EmployeeRecord {
        head_of_department: Some(id(number)),
        ..employee(number, "03", "OFF-9")
    };

    let via_office_head = EmployeeRecord {
        head_of_office: Some(id("GOV1")),
        ..self_headed("HD01")
    };
    let via_supervisor = EmployeeRecord {
        supervisor_id: Some(id("GOV1")),
        ..self_headed("HD02")
    };
    let elsewhere = EmployeeRecord {
        supervisor_id: Some(id("GOV9")),
        ..self_headed("HD03")
    };
    let not_a_head = EmployeeRecord {
        supervisor_id: Some(id("GOV1")),
        ..employee("E001", "05", "OFF-9")
    };
    let other_governor = EmployeeRecord {
        job_title: "Governor".to_string(),
        supervisor_id: Some(id("GOV1")),
        ..self_headed("GOV2")
    };

    let resolver = resolver(vec![
        governor.clone(),
        via_office_head,
        via_supervisor,
        elsewhere,
        not_a_head,
        other_governor,
    ]);

    let candidates = resolver
        .subordinate_candidates(&governor)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["HD01", "HD02"]));
}

#[test]
fn governor_peers_are_the_other_governors() {
    let governor = |number: &str, title: &str| EmployeeRecord {
        job_title: title.to_string(),
        ..employee(number, "41", "OFF-GOV")
    };
    let subject = governor("GOV1", "Governor");
    let resolver = resolver(vec![
        subject.clone(),
        governor("GOV2", "Deputy Governor, Economic Policy"),
        governor("GOV3", "deputy governor"),
        employee("E001", "41", "OFF-GOV"),
    ]);

    let candidates = resolver
        .peer_candidates(&subject)
        .expect("directory reachable");
    assert_eq!(ids(&candidates), expected_ids(&["GOV2", "GOV3"]));
}

#[test]
fn select_by_id_reports_unknown_employee() {
    let resolver = resolver(treasury_team());

    match resolver.select_peer(&id("NOPE")) {
        Err(ResolverError::UnknownEmployee(missing)) => assert_eq!(missing, id("NOPE")),
        other => panic!("expected unknown employee, got {other:?}"),
    }
}

#[test]
fn select_by_id_returns_none_for_empty_candidate_set() {
    let resolver = resolver(treasury_team());

    let selected = resolver
        .select_superior(&id("A001"))
        .expect("directory reachable");
    assert!(selected.is_none());
}

#[test]
fn picker_decides_which_candidate_is_returned() {
    let team = treasury_team();
    let first = resolver(team.clone());
    let last = OrgHierarchyResolver::new(organisation(team), Arc::new(LastPicker));

    let chosen_first = first
        .select_subordinate(&id("M001"))
        .expect("directory reachable")
        .expect("manager has subordinates");
    let chosen_last = last
        .select_subordinate(&id("M001"))
        .expect("directory reachable")
        .expect("manager has subordinates");

    assert_eq!(chosen_first.employee_number, id("A001"));
    assert_eq!(chosen_last.employee_number, id("C001"));
}

#[test]
fn thread_rng_picker_stays_in_bounds() {
    let picker = ThreadRngPicker;
    assert_eq!(picker.pick(0), None);
    assert_eq!(picker.pick(1), Some(0));
    for _ in 0..50 {
        let index = picker.pick(3).expect("non-empty");
        assert!(index < 3);
    }
}
