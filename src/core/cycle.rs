use crate::change::Direction;
use crate::identify::Ident;
use crate::identify::Identify;
use crate::identify::Index;
use crate::util::BuildIdHasher;
use crate::util::Util;

use std::cell::Cell;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::VecDeque;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InsertPos {
    Front,
    Back,
}

#[derive(Clone, Copy)]
pub enum Selector<'a, T> {
    AtActive,
    AtIndex(Index),
    AtIdent(Ident),
    First,
    Last,
    ForCond(&'a dyn Fn(&T) -> bool),
}

#[derive(Clone, Copy, PartialEq)]
enum StackAction {
    Insert,
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
struct HistoryStack {
    stack: VecDeque<Ident>,
}

impl HistoryStack {
    fn new() -> Self {
        HistoryStack {
            stack: VecDeque::with_capacity(30),
        }
    }

    fn clear(&mut self) {
        self.stack.clear();
    }

    fn push_back(
        &mut self,
        id: Ident,
    ) {
        self.stack.push_back(id);
    }

    fn pop_back(&mut self) -> Option<Ident> {
        self.stack.pop_back()
    }

    fn remove_id(
        &mut self,
        id: Ident,
    ) {
        if let Some(index) = self.stack.iter().rposition(|&i| i == id) {
            self.stack.remove(index);
        }
    }

    fn as_vec(&self) -> Vec<Ident> {
        self.stack.iter().cloned().collect()
    }
}

/// An ordered collection with an active element, wrap-around traversal,
/// and an activation history that unwinds on removal. The focus list and
/// the focus-cycle candidate ring are both instances.
#[derive(Debug, Clone, PartialEq)]
pub struct Cycle<T>
where
    T: Identify + std::fmt::Debug,
{
    index: Cell<Index>,
    elements: VecDeque<T>,
    indices: HashMap<Ident, Index, BuildIdHasher>,
    unwindable: bool,
    stack: RefCell<HistoryStack>,
}

impl<T> Cycle<T>
where
    T: Identify + std::fmt::Debug,
{
    pub fn new(
        elements: Vec<T>,
        unwindable: bool,
    ) -> Self {
        Self {
            indices: elements
                .iter()
                .enumerate()
                .map(|(i, e)| (e.id(), i))
                .collect(),
            index: Cell::new(Util::last_index(elements.iter())),
            elements: elements.into(),
            unwindable,
            stack: RefCell::new(HistoryStack::new()),
        }
    }

    #[inline]
    fn index(&self) -> Option<Index> {
        if self.index.get() < self.elements.len() {
            Some(self.index.get())
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.index.set(0);
        self.elements.clear();
        self.indices.clear();
        self.stack.borrow_mut().clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn contains(
        &self,
        element: &T,
    ) -> bool {
        self.elements.contains(element)
    }

    #[inline]
    pub fn contains_id(
        &self,
        id: Ident,
    ) -> bool {
        self.indices.contains_key(&id)
    }

    #[inline]
    pub fn active_index(&self) -> Index {
        self.index.get()
    }

    #[inline]
    pub fn active_element(&self) -> Option<&T> {
        self.elements.get(self.index.get())
    }

    pub fn cycle_active(
        &self,
        dir: Direction,
    ) -> Option<&T> {
        self.push_active_to_stack();
        self.index.set(self.next_index_from(self.index.get(), dir));
        self.active_element()
    }

    pub fn index_for(
        &self,
        sel: &Selector<T>,
    ) -> Option<Index> {
        match sel {
            Selector::AtActive => self.index(),
            Selector::AtIndex(index) => {
                if *index < self.len() {
                    return Some(*index);
                }

                None
            },
            Selector::AtIdent(id) => self.id_to_index(*id),
            Selector::First => {
                if self.elements.is_empty() {
                    None
                } else {
                    Some(0)
                }
            },
            Selector::Last => {
                if self.elements.is_empty() {
                    None
                } else {
                    Some(self.elements.len() - 1)
                }
            },
            Selector::ForCond(f) => self.by(f).map(|(i, _)| i),
        }
    }

    pub fn get_for(
        &self,
        sel: &Selector<T>,
    ) -> Option<&T> {
        self.index_for(sel).and_then(|index| self.elements.get(index))
    }

    pub fn insert_at(
        &mut self,
        insert_pos: &InsertPos,
        element: T,
    ) {
        match insert_pos {
            InsertPos::Front => self.push_front(element),
            InsertPos::Back => self.push_back(element),
        }
    }

    pub fn push_front(
        &mut self,
        element: T,
    ) {
        self.push_active_to_stack();
        self.sync_indices(0, StackAction::Insert);
        self.indices.insert(element.id(), 0);
        self.elements.push_front(element);
        self.index.set(0);
    }

    pub fn push_back(
        &mut self,
        element: T,
    ) {
        let end = self.elements.len();

        self.push_active_to_stack();
        self.indices.insert(element.id(), end);
        self.elements.push_back(element);
        self.index.set(end);
    }

    #[inline]
    pub fn iter(&self) -> std::collections::vec_deque::Iter<T> {
        self.elements.iter()
    }

    pub fn activate_for(
        &self,
        sel: &Selector<T>,
    ) -> Option<&T> {
        match sel {
            Selector::AtActive => self.active_element(),
            _ => {
                if let Some(index) = self.index_for(sel) {
                    self.push_active_to_stack();
                    self.index.set(index);
                    self.active_element()
                } else {
                    None
                }
            },
        }
    }

    pub fn remove_for(
        &mut self,
        sel: &Selector<T>,
    ) -> Option<T> {
        let index = self.index_for(sel)?;
        let element = self.elements.remove(index);

        if let Some(ref element) = element {
            let id = element.id();

            self.indices.remove(&id);
            self.remove_from_stack(id);
            self.sync_indices(index, StackAction::Remove);
        }

        element
    }

    /// The activation history, least-recent first, with the active element
    /// moved to the end. Reversing yields most-recently-active-first order.
    pub fn stack_after_focus(&self) -> Vec<Ident> {
        let mut stack: Vec<Ident> = self.stack.borrow().as_vec();

        if let Some(index) = self.index() {
            if let Some(id) = self.index_to_id(index) {
                if let Some(found_index) = stack.iter().rposition(|i| *i == id) {
                    stack.remove(found_index);
                }

                stack.push(id);
            }
        }

        stack
    }

    fn next_index_from(
        &self,
        index: Index,
        dir: Direction,
    ) -> Index {
        let end = Util::last_index(self.elements.iter());

        match dir {
            Direction::Forward => {
                if index == end {
                    0
                } else {
                    index + 1
                }
            },
            Direction::Backward => {
                if index == 0 {
                    end
                } else {
                    index - 1
                }
            },
        }
    }

    fn sync_indices(
        &mut self,
        pivot_index: Index,
        action: StackAction,
    ) {
        for index in pivot_index..self.elements.len() {
            let id = self.elements.get(index).unwrap().id();

            match action {
                StackAction::Remove => *self.indices.get_mut(&id).unwrap() -= 1,
                StackAction::Insert => *self.indices.get_mut(&id).unwrap() += 1,
            }
        }

        if action == StackAction::Remove {
            match pivot_index.cmp(&self.index.get()) {
                Ordering::Equal => {
                    if let Some(id) = self.pop_from_stack() {
                        if let Some(index) = self.id_to_index(id) {
                            self.index.set(index);
                            return;
                        }
                    }

                    self.index.set(Util::last_index(self.elements.iter()));
                },
                Ordering::Less => {
                    let index = self.index.get();

                    if index > 0 {
                        self.index.set(index - 1);
                    }
                },
                Ordering::Greater => {},
            }
        }
    }

    fn by(
        &self,
        cond: impl Fn(&T) -> bool,
    ) -> Option<(Index, &T)> {
        self.elements.iter().enumerate().find(|(_, e)| cond(*e))
    }

    fn index_to_id(
        &self,
        index: Index,
    ) -> Option<Ident> {
        self.elements.get(index).map(|element| element.id())
    }

    fn id_to_index(
        &self,
        id: Ident,
    ) -> Option<Index> {
        self.indices.get(&id).copied()
    }

    fn push_active_to_stack(&self) {
        if !self.unwindable {
            return;
        }

        if let Some(index) = self.index() {
            if let Some(id) = self.index_to_id(index) {
                let mut stack = self.stack.borrow_mut();
                stack.remove_id(id);
                stack.push_back(id);
            }
        }
    }

    #[inline]
    fn remove_from_stack(
        &self,
        id: Ident,
    ) {
        if !self.unwindable {
            return;
        }

        self.stack.borrow_mut().remove_id(id);
    }

    #[inline]
    fn pop_from_stack(&self) -> Option<Ident> {
        if !self.unwindable {
            return None;
        }

        self.stack.borrow_mut().pop_back()
    }
}

impl<T: Identify + std::fmt::Debug> std::ops::Index<Index> for Cycle<T> {
    type Output = T;

    fn index(
        &self,
        index: Index,
    ) -> &Self::Output {
        &self.elements[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod i32 {
        impl super::Identify for i32 {
            fn id(&self) -> super::Ident {
                *self as super::Ident
            }
        }
    }

    #[test]
    fn removing_element_before_active_shifts_indices() {
        let mut cycle = Cycle::new(vec![0, 10, 20, 30, 40], false);

        assert_eq!(cycle.active_index(), 4);

        cycle.remove_for(&Selector::AtIndex(1));

        assert_eq!(cycle.active_index(), 3);
        assert_eq!(cycle.index_for(&Selector::AtIdent(0)), Some(0));
        assert_eq!(cycle.index_for(&Selector::AtIdent(10)), None);
        assert_eq!(cycle.index_for(&Selector::AtIdent(20)), Some(1));
        assert_eq!(cycle.index_for(&Selector::AtIdent(30)), Some(2));
        assert_eq!(cycle.index_for(&Selector::AtIdent(40)), Some(3));
        assert_eq!(cycle.active_element(), Some(&40));
    }

    #[test]
    fn removing_active_element_unwinds_history() {
        let cycle = Cycle::new(vec![0, 10, 20, 30], true);

        cycle.activate_for(&Selector::AtIdent(10));
        cycle.activate_for(&Selector::AtIdent(20));
        assert_eq!(cycle.active_element(), Some(&20));

        let mut cycle = cycle;
        cycle.remove_for(&Selector::AtActive);

        // Unwinds to the previously activated element.
        assert_eq!(cycle.active_element(), Some(&10));
    }

    #[test]
    fn cycling_wraps_in_both_directions() {
        let cycle = Cycle::new(vec![0, 10, 20], false);

        assert_eq!(cycle.active_element(), Some(&20));
        assert_eq!(cycle.cycle_active(Direction::Forward), Some(&0));
        assert_eq!(cycle.cycle_active(Direction::Backward), Some(&20));
        assert_eq!(cycle.cycle_active(Direction::Backward), Some(&10));
    }

    #[test]
    fn stack_after_focus_ends_with_active() {
        let cycle = Cycle::new(vec![1, 2, 3], true);

        cycle.activate_for(&Selector::AtIdent(1));
        cycle.activate_for(&Selector::AtIdent(3));
        cycle.activate_for(&Selector::AtIdent(2));

        let stack = cycle.stack_after_focus();
        assert_eq!(stack.last(), Some(&2));
        assert_eq!(stack.len(), 3);
    }
}
