//! Department queue ordering and statistics.
//!
//! Waiting tokens are served highest triage score first. Equal scores are
//! served in arrival order (earliest `created_at`, then lowest sequence), so
//! the order never depends on how the store happens to return records.

use crate::models::{Department, Token, TokenStatus};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Service order between two waiting tokens.
pub fn service_order(a: &Token, b: &Token) -> Ordering {
    b.triage_score
        .cmp(&a.triage_score)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.sequence.cmp(&b.sequence))
}

/// Waiting tokens of one department in service order.
pub fn order_waiting(tokens: &[Token], department: Department) -> Vec<Token> {
    let mut waiting: Vec<Token> = tokens
        .iter()
        .filter(|t| t.department == department && t.status == TokenStatus::Waiting)
        .cloned()
        .collect();
    waiting.sort_by(service_order);
    waiting
}

/// One department's tokens split by status.
///
/// Only `waiting` is ordered; the other buckets keep the input order.
#[derive(Debug, Clone, Default)]
pub struct DepartmentBoard {
    pub department: Option<Department>,
    pub waiting: Vec<Token>,
    pub in_progress: Vec<Token>,
    pub completed: Vec<Token>,
}

impl DepartmentBoard {
    /// Next token to call in, if any.
    pub fn next_up(&self) -> Option<&Token> {
        self.waiting.first()
    }

    pub fn total(&self) -> usize {
        self.waiting.len() + self.in_progress.len() + self.completed.len()
    }
}

pub fn department_board(tokens: &[Token], department: Department) -> DepartmentBoard {
    let mut board = DepartmentBoard {
        department: Some(department),
        ..Default::default()
    };

    for token in tokens.iter().filter(|t| t.department == department) {
        match token.status {
            TokenStatus::Waiting => board.waiting.push(token.clone()),
            TokenStatus::InProgress => board.in_progress.push(token.clone()),
            TokenStatus::Completed => board.completed.push(token.clone()),
        }
    }
    board.waiting.sort_by(service_order);
    board
}

/// Waiting-token counts per department. Departments with nobody waiting are
/// left out.
pub fn queue_sizes(tokens: &[Token]) -> BTreeMap<Department, usize> {
    let mut sizes = BTreeMap::new();
    for token in tokens.iter().filter(|t| t.status == TokenStatus::Waiting) {
        *sizes.entry(token.department).or_insert(0) += 1;
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, UrgencyTier};
    use crate::triage::classify;
    use chrono::{Local, TimeZone};

    fn token(sequence: u64, department: Department, score: u8, minute: u32, status: TokenStatus) -> Token {
        Token {
            token: format!("#K{:04}", sequence),
            sequence,
            patient_name: format!("Patient {}", sequence),
            age: 30,
            gender: Gender::Female,
            department,
            symptoms: vec!["headache".to_string()],
            triage_score: score,
            urgency_tier: classify(score),
            status,
            estimated_wait_minutes: 0,
            doctor: None,
            created_at: Local.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_highest_score_first() {
        let tokens = vec![
            token(1, Department::General, 3, 0, TokenStatus::Waiting),
            token(2, Department::General, 9, 1, TokenStatus::Waiting),
            token(3, Department::General, 5, 2, TokenStatus::Waiting),
        ];
        let order: Vec<u64> = order_waiting(&tokens, Department::General)
            .iter()
            .map(|t| t.sequence)
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_ties_served_in_arrival_order() {
        // Input deliberately newest-first, the way the store lists tokens.
        let tokens = vec![
            token(4, Department::Neurology, 6, 30, TokenStatus::Waiting),
            token(3, Department::Neurology, 6, 20, TokenStatus::Waiting),
            token(2, Department::Neurology, 6, 20, TokenStatus::Waiting),
            token(1, Department::Neurology, 8, 40, TokenStatus::Waiting),
        ];
        let order: Vec<u64> = order_waiting(&tokens, Department::Neurology)
            .iter()
            .map(|t| t.sequence)
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_other_departments_and_statuses_excluded() {
        let tokens = vec![
            token(1, Department::General, 3, 0, TokenStatus::Waiting),
            token(2, Department::Cardiology, 9, 1, TokenStatus::Waiting),
            token(3, Department::General, 10, 2, TokenStatus::InProgress),
        ];
        let waiting = order_waiting(&tokens, Department::General);
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].sequence, 1);
    }

    #[test]
    fn test_department_board_partitions() {
        let tokens = vec![
            token(1, Department::Pediatrics, 2, 0, TokenStatus::Completed),
            token(2, Department::Pediatrics, 4, 1, TokenStatus::Waiting),
            token(3, Department::Pediatrics, 7, 2, TokenStatus::InProgress),
            token(4, Department::Pediatrics, 9, 3, TokenStatus::Waiting),
            token(5, Department::General, 9, 3, TokenStatus::Waiting),
        ];
        let board = department_board(&tokens, Department::Pediatrics);
        assert_eq!(board.total(), 4);
        assert_eq!(board.next_up().map(|t| t.sequence), Some(4));
        assert_eq!(board.in_progress.len(), 1);
        assert_eq!(board.completed.len(), 1);
    }

    #[test]
    fn test_queue_sizes_counts_waiting_only() {
        let tokens = vec![
            token(1, Department::General, 3, 0, TokenStatus::Waiting),
            token(2, Department::General, 3, 1, TokenStatus::Waiting),
            token(3, Department::Cardiology, 9, 2, TokenStatus::Waiting),
            token(4, Department::Neurology, 9, 3, TokenStatus::Completed),
        ];
        let sizes = queue_sizes(&tokens);
        assert_eq!(sizes.get(&Department::General), Some(&2));
        assert_eq!(sizes.get(&Department::Cardiology), Some(&1));
        assert!(!sizes.contains_key(&Department::Neurology));
    }
}
