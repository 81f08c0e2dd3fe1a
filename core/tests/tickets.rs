//! Ticket generation, the draw, and match counting.

use lotto_core::{
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    ticket::{self, combinations, Domain, Ticket},
};
use std::collections::HashSet;

fn rng(seed: u64) -> SubsystemRng {
    RngBank::new(seed).for_subsystem_at_round(SubsystemSlot::Tickets, 0)
}

#[test]
fn tickets_have_n_distinct_numbers_inside_domain() {
    let domain = Domain::new(1, 20);
    let mut rng = rng(42);
    for _ in 0..500 {
        let t = ticket::generate_ticket(&domain, 6, &mut rng);
        assert_eq!(t.len(), 6);
        assert!(t.numbers().windows(2).all(|w| w[0] < w[1]), "not sorted/unique: {t}");
        assert!(t.numbers().iter().all(|&n| domain.contains(n)));
    }
}

#[test]
fn draw_has_ticket_shape() {
    let domain = Domain::new(-3, 3);
    let mut rng = RngBank::new(5).for_subsystem_at_round(SubsystemSlot::Draw, 0);
    let winning = ticket::draw(&domain, 4, &mut rng);
    assert_eq!(winning.len(), 4);
    assert!(winning.numbers().iter().all(|&n| domain.contains(n)));
}

#[test]
fn user_batch_is_pairwise_distinct() {
    let domain = Domain::new(1, 8);
    let mut rng = rng(7);
    for _ in 0..50 {
        let batch = ticket::generate_user_batch(&domain, 3, 40, &mut rng);
        assert_eq!(batch.len(), 40);
        let unique: HashSet<&Ticket> = batch.iter().collect();
        assert_eq!(unique.len(), batch.len(), "duplicate ticket in one user's batch");
    }
}

#[test]
fn oversized_request_is_clamped_to_capacity() {
    // C(5, 2) = 10 distinct combinations.
    let domain = Domain::new(1, 5);
    assert_eq!(combinations(domain.size(), 2), 10);

    let batch = ticket::generate_user_batch(&domain, 2, 1000, &mut rng(1));
    assert_eq!(batch.len(), 10);

    let unique: HashSet<Ticket> = batch.into_iter().collect();
    assert_eq!(unique.len(), 10);
}

#[test]
fn full_domain_draw_has_a_single_combination() {
    let domain = Domain::new(1, 4);
    let batch = ticket::generate_user_batch(&domain, 4, 3, &mut rng(3));
    assert_eq!(batch, vec![Ticket::from_numbers([1, 2, 3, 4])]);
}

#[test]
fn zero_ticket_request_yields_empty_batch() {
    let batch = ticket::generate_user_batch(&Domain::new(1, 10), 3, 0, &mut rng(9));
    assert!(batch.is_empty());
}

#[test]
fn saturated_capacity_batch_draws_what_was_asked() {
    let domain = Domain::new(1, 1000);
    assert_eq!(combinations(domain.size(), 10), u64::MAX);

    let batch = ticket::generate_user_batch(&domain, 10, 3_000, &mut rng(21));
    assert_eq!(batch.len(), 3_000);
    let unique: HashSet<&Ticket> = batch.iter().collect();
    assert_eq!(unique.len(), 3_000);
    assert!(batch.iter().all(|t| t.len() == 10));
}

#[test]
fn match_count_is_intersection_size() {
    let ticket = Ticket::from_numbers([1, 2, 3]);
    let winning = Ticket::from_numbers([2, 3, 4]);
    assert_eq!(ticket.match_count(&winning), 2);
    assert_eq!(winning.match_count(&ticket), 2);
    assert_eq!(ticket.match_count(&ticket), 3);
    assert_eq!(ticket.match_count(&Ticket::from_numbers([7, 8, 9])), 0);
}

#[test]
fn match_count_bounded_by_n_for_random_tickets() {
    let domain = Domain::new(1, 12);
    let mut rng = rng(11);
    for _ in 0..1_000 {
        let a = ticket::generate_ticket(&domain, 5, &mut rng);
        let b = ticket::generate_ticket(&domain, 5, &mut rng);
        let expected = a
            .numbers()
            .iter()
            .filter(|&&n| b.numbers().contains(&n))
            .count() as u32;
        let m = a.match_count(&b);
        assert_eq!(m, expected);
        assert!(m <= 5);
    }
}

#[test]
fn distinct_tickets_cannot_both_fully_match() {
    let domain = Domain::new(1, 10);
    let mut rng = rng(21);
    for _ in 0..200 {
        let winning = ticket::draw(&domain, 3, &mut rng);
        let batch = ticket::generate_user_batch(&domain, 3, 60, &mut rng);
        let full = batch.iter().filter(|t| t.match_count(&winning) == 3).count();
        assert!(full <= 1, "{full} distinct tickets matched all 3 numbers");
    }
}
