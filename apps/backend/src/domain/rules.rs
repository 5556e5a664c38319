use std::ops::RangeInclusive;

pub const PLAYERS: usize = 4;
pub const TOTAL_ROUNDS: u8 = 24;
pub const TOTAL_PULKAS: u8 = 4;
pub const MAX_REDEALS: u8 = 2;

/// Cards the trump chooser sees while deciding (partial deal).
pub const TRUMP_SELECTION_VISIBLE_CARDS: usize = 3;

// Hand-size schedule: pulka 1 ascends 1..=8, pulka 2 is four rounds of 9,
// pulka 3 descends 8..=1, pulka 4 is four rounds of 9. Total 24 rounds.
pub fn cards_for_round(round: u8) -> Option<u8> {
    match round {
        1..=8 => Some(round),
        9..=12 => Some(9),
        13..=20 => Some(21 - round),
        21..=24 => Some(9),
        _ => None,
    }
}

pub fn pulka_for_round(round: u8) -> Option<u8> {
    match round {
        1..=8 => Some(1),
        9..=12 => Some(2),
        13..=20 => Some(3),
        21..=24 => Some(4),
        _ => None,
    }
}

pub fn rounds_of_pulka(pulka: u8) -> Option<RangeInclusive<u8>> {
    match pulka {
        1 => Some(1..=8),
        2 => Some(9..=12),
        3 => Some(13..=20),
        4 => Some(21..=24),
        _ => None,
    }
}

pub fn is_last_round_of_pulka(round: u8) -> bool {
    matches!(round, 8 | 12 | 20 | 24)
}

pub fn valid_bet_range(cards_per_player: u8) -> RangeInclusive<u8> {
    0..=cards_per_player
}

/// The dealer-only forbidden bet: the exact value that would make the sum
/// of all four bets equal the number of tricks in the round.
///
/// Returns `None` for non-dealer seats, or when the remaining value falls
/// outside the legal bet range (in which case every in-range bet is fine).
pub fn forbidden_bet(
    bets: &[Option<u8>; PLAYERS],
    cards_per_player: u8,
    seat: u8,
    dealer: u8,
) -> Option<u8> {
    if seat != dealer {
        return None;
    }
    let sum: u8 = bets.iter().flatten().sum();
    let remaining = cards_per_player.checked_sub(sum)?;
    // remaining <= cards_per_player always holds here
    Some(remaining)
}

/// All bets the seat may legally submit right now.
pub fn legal_bets(
    bets: &[Option<u8>; PLAYERS],
    cards_per_player: u8,
    seat: u8,
    dealer: u8,
) -> Vec<u8> {
    let forbidden = forbidden_bet(bets, cards_per_player, seat, dealer);
    valid_bet_range(cards_per_player)
        .filter(|b| Some(*b) != forbidden)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_is_correct() {
        let expected: [u8; 24] = [
            1, 2, 3, 4, 5, 6, 7, 8, // pulka 1
            9, 9, 9, 9, // pulka 2
            8, 7, 6, 5, 4, 3, 2, 1, // pulka 3
            9, 9, 9, 9, // pulka 4
        ];
        for (i, &cards) in expected.iter().enumerate() {
            assert_eq!(cards_for_round((i as u8) + 1), Some(cards));
        }
        assert_eq!(cards_for_round(0), None);
        assert_eq!(cards_for_round(25), None);
    }

    #[test]
    fn pulka_boundaries() {
        assert_eq!(pulka_for_round(1), Some(1));
        assert_eq!(pulka_for_round(8), Some(1));
        assert_eq!(pulka_for_round(9), Some(2));
        assert_eq!(pulka_for_round(12), Some(2));
        assert_eq!(pulka_for_round(13), Some(3));
        assert_eq!(pulka_for_round(20), Some(3));
        assert_eq!(pulka_for_round(21), Some(4));
        assert_eq!(pulka_for_round(24), Some(4));
        assert_eq!(pulka_for_round(25), None);

        for round in 1..=TOTAL_ROUNDS {
            let pulka = pulka_for_round(round).unwrap();
            assert!(rounds_of_pulka(pulka).unwrap().contains(&round));
            assert_eq!(
                is_last_round_of_pulka(round),
                round == *rounds_of_pulka(pulka).unwrap().end()
            );
        }
    }

    #[test]
    fn forbidden_bet_only_binds_the_dealer() {
        let bets = [Some(1), Some(2), Some(0), None];
        // Dealer at seat 3: 7 - 3 = 4 is forbidden.
        assert_eq!(forbidden_bet(&bets, 7, 3, 3), Some(4));
        // Any other seat has no restriction.
        assert_eq!(forbidden_bet(&bets, 7, 1, 3), None);
    }

    #[test]
    fn forbidden_bet_outside_range_means_everything_is_legal() {
        // Others already bet above the round length: nothing to forbid.
        let bets = [Some(3), Some(3), Some(3), None];
        assert_eq!(forbidden_bet(&bets, 7, 3, 3), None);
        assert_eq!(legal_bets(&bets, 7, 3, 3).len(), 8);
    }

    #[test]
    fn legal_bets_excludes_exactly_the_forbidden_value() {
        let bets = [Some(0), Some(0), Some(1), None];
        let legal = legal_bets(&bets, 1, 3, 3);
        // forbidden = 1 - 1 = 0
        assert_eq!(legal, vec![1]);

        let legal = legal_bets(&bets, 1, 0, 3);
        assert_eq!(legal, vec![0, 1]);
    }
}
