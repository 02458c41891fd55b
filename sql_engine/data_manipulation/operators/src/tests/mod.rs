// Copyright 2020 - 2021 Alex Dukhno
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::*;

#[rstest::rstest(
    ast_operator,
    expected,
    case::plus(BinaryOperator::Plus, BiOperator::Arithmetic(BiArithmetic::Add)),
    case::minus(BinaryOperator::Minus, BiOperator::Arithmetic(BiArithmetic::Sub)),
    case::multiply(BinaryOperator::Multiply, BiOperator::Arithmetic(BiArithmetic::Mul)),
    case::divide(BinaryOperator::Divide, BiOperator::Arithmetic(BiArithmetic::Div)),
    case::modulus(BinaryOperator::Modulus, BiOperator::Arithmetic(BiArithmetic::Mod)),
    case::gt(BinaryOperator::Gt, BiOperator::Comparison(Comparison::Gt)),
    case::lt(BinaryOperator::Lt, BiOperator::Comparison(Comparison::Lt)),
    case::gt_eq(BinaryOperator::GtEq, BiOperator::Comparison(Comparison::GtEq)),
    case::lt_eq(BinaryOperator::LtEq, BiOperator::Comparison(Comparison::LtEq)),
    case::eq(BinaryOperator::Eq, BiOperator::Comparison(Comparison::Eq)),
    case::not_eq(BinaryOperator::NotEq, BiOperator::Comparison(Comparison::NotEq)),
    case::and(BinaryOperator::And, BiOperator::Logical(BiLogical::And)),
    case::or(BinaryOperator::Or, BiOperator::Logical(BiLogical::Or)),
    case::like(BinaryOperator::Like, BiOperator::Matching(Matching::Like)),
    case::not_like(BinaryOperator::NotLike, BiOperator::Matching(Matching::NotLike))
)]
fn binary_op(ast_operator: BinaryOperator, expected: BiOperator) {
    assert_eq!(BiOperator::from(ast_operator), expected);
}

#[rstest::rstest(
    ast_operator,
    expected,
    case::plus(UnaryOperator::Plus, UnOperator::Pos),
    case::minus(UnaryOperator::Minus, UnOperator::Neg),
    case::not(UnaryOperator::Not, UnOperator::LogicalNot)
)]
fn unary_op(ast_operator: UnaryOperator, expected: UnOperator) {
    assert_eq!(UnOperator::from(ast_operator), expected);
}

#[cfg(test)]
mod arithmetic {
    use super::*;

    #[test]
    fn integer_operands_stay_integer() {
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Add).eval(ScalarValue::Int(1), ScalarValue::Int(2)),
            ScalarValue::Int(3)
        );
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Div).eval(ScalarValue::Int(3), ScalarValue::Int(2)),
            ScalarValue::Int(1)
        );
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Mod).eval(ScalarValue::Int(5), ScalarValue::Int(2)),
            ScalarValue::Int(1)
        );
    }

    #[test]
    fn float_operand_widens() {
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Div).eval(ScalarValue::Float(3.0), ScalarValue::Int(2)),
            ScalarValue::Float(1.5)
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Div).eval(ScalarValue::Int(1), ScalarValue::Int(0)),
            ScalarValue::Error
        );
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Mod).eval(ScalarValue::Int(1), ScalarValue::Int(0)),
            ScalarValue::Error
        );
    }

    #[test]
    fn modulus_is_undefined_for_floats() {
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Mod).eval(ScalarValue::Float(5.0), ScalarValue::Int(2)),
            ScalarValue::Error
        );
    }

    #[test]
    fn null_propagates() {
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Add).eval(ScalarValue::Null, ScalarValue::Int(2)),
            ScalarValue::Null
        );
    }

    #[test]
    fn error_wins_over_null() {
        assert_eq!(
            BiOperator::Arithmetic(BiArithmetic::Add).eval(ScalarValue::Error, ScalarValue::Null),
            ScalarValue::Error
        );
    }
}

#[cfg(test)]
mod comparisons {
    use super::*;

    #[test]
    fn comparisons_materialize_as_int_flags() {
        assert_eq!(
            BiOperator::Comparison(Comparison::Lt).eval(ScalarValue::Int(1), ScalarValue::Int(2)),
            ScalarValue::Int(1)
        );
        assert_eq!(
            BiOperator::Comparison(Comparison::Eq).eval(ScalarValue::Int(1), ScalarValue::Int(2)),
            ScalarValue::Int(0)
        );
    }

    #[test]
    fn mixed_numeric_kinds_compare_as_reals() {
        assert_eq!(
            BiOperator::Comparison(Comparison::Eq).eval(ScalarValue::Int(1), ScalarValue::Float(1.0)),
            ScalarValue::Int(1)
        );
    }

    #[test]
    fn null_side_yields_null() {
        assert_eq!(
            BiOperator::Comparison(Comparison::Eq).eval(ScalarValue::Null, ScalarValue::Int(1)),
            ScalarValue::Null
        );
    }
}

#[cfg(test)]
mod matching {
    use super::*;

    fn like(value: &str, pattern: &str) -> bool {
        BiOperator::Matching(Matching::Like).eval(
            ScalarValue::String(value.to_owned()),
            ScalarValue::String(pattern.to_owned()),
        ) == ScalarValue::Int(1)
    }

    #[test]
    fn literal_pattern_is_anchored() {
        assert!(like("abc", "abc"));
        assert!(!like("xabc", "abc"));
        assert!(!like("abcx", "abc"));
    }

    #[test]
    fn percent_matches_any_substring() {
        assert!(like("abcdef", "abc%"));
        assert!(like("xyzabc", "%abc"));
        assert!(like("abc", "a%c"));
        assert!(!like("abd", "abc%"));
    }

    #[test]
    fn underscore_matches_one_character() {
        assert!(like("abc", "a_c"));
        assert!(!like("abbc", "a_c"));
    }

    #[test]
    fn backslash_escapes_wildcards() {
        assert!(like("100%", "100\\%"));
        assert!(!like("1000", "100\\%"));
    }

    #[test]
    fn regex_metacharacters_match_literally() {
        assert!(like("a.c", "a.c"));
        assert!(!like("abc", "a.c"));
    }

    #[test]
    fn not_like_inverts() {
        assert_eq!(
            BiOperator::Matching(Matching::NotLike).eval(
                ScalarValue::String("abc".to_owned()),
                ScalarValue::String("xyz".to_owned())
            ),
            ScalarValue::Int(1)
        );
    }
}

#[cfg(test)]
mod scalar_functions {
    use super::*;

    fn s(value: &str) -> ScalarValue {
        ScalarValue::String(value.to_owned())
    }

    #[test]
    fn abs_keeps_the_numeric_kind() {
        assert_eq!(ScalarFunction::Abs.eval(&[ScalarValue::Int(-5)]), ScalarValue::Int(5));
        assert_eq!(ScalarFunction::Abs.eval(&[ScalarValue::Float(-2.5)]), ScalarValue::Float(2.5));
    }

    #[test]
    fn sqrt_of_negative_is_null() {
        assert_eq!(ScalarFunction::Sqrt.eval(&[ScalarValue::Int(-1)]), ScalarValue::Null);
        assert_eq!(ScalarFunction::Sqrt.eval(&[ScalarValue::Int(9)]), ScalarValue::Float(3.0));
    }

    #[test]
    fn mod_by_zero_is_null() {
        assert_eq!(
            ScalarFunction::Mod.eval(&[ScalarValue::Int(5), ScalarValue::Int(0)]),
            ScalarValue::Null
        );
        assert_eq!(
            ScalarFunction::Mod.eval(&[ScalarValue::Int(5), ScalarValue::Int(2)]),
            ScalarValue::Float(1.0)
        );
    }

    #[test]
    fn round_without_digits_is_integer() {
        assert_eq!(ScalarFunction::Round.eval(&[ScalarValue::Float(2.6)]), ScalarValue::Int(3));
        assert_eq!(
            ScalarFunction::Round.eval(&[ScalarValue::Float(1.25), ScalarValue::Int(1)]),
            ScalarValue::Float(1.3)
        );
    }

    #[test]
    fn floor_and_ceil_produce_integers() {
        assert_eq!(ScalarFunction::Floor.eval(&[ScalarValue::Float(2.9)]), ScalarValue::Int(2));
        assert_eq!(ScalarFunction::Ceil.eval(&[ScalarValue::Float(2.1)]), ScalarValue::Int(3));
    }

    #[test]
    fn string_slicing() {
        assert_eq!(ScalarFunction::Left.eval(&[s("abcdef"), ScalarValue::Int(3)]), s("abc"));
        assert_eq!(ScalarFunction::Right.eval(&[s("abcdef"), ScalarValue::Int(2)]), s("ef"));
        assert_eq!(ScalarFunction::Mid.eval(&[s("abcdef"), ScalarValue::Int(2)]), s("bcdef"));
        assert_eq!(
            ScalarFunction::Mid.eval(&[s("abcdef"), ScalarValue::Int(2), ScalarValue::Int(3)]),
            s("bcd")
        );
        assert_eq!(ScalarFunction::Mid.eval(&[s("abc"), ScalarValue::Int(10)]), s(""));
    }

    #[test]
    fn case_folding_and_length() {
        assert_eq!(ScalarFunction::Upper.eval(&[s("aBc")]), s("ABC"));
        assert_eq!(ScalarFunction::Lower.eval(&[s("aBc")]), s("abc"));
        assert_eq!(ScalarFunction::Length.eval(&[s("abcd")]), ScalarValue::Int(4));
    }

    #[test]
    fn concat_stringifies_numerics() {
        assert_eq!(
            ScalarFunction::Concat.eval(&[s("id-"), ScalarValue::Int(7)]),
            s("id-7")
        );
    }

    #[test]
    fn concat_with_null_is_null() {
        assert_eq!(
            ScalarFunction::Concat.eval(&[s("a"), ScalarValue::Null, s("b")]),
            ScalarValue::Null
        );
    }

    #[test]
    fn null_argument_yields_null() {
        assert_eq!(ScalarFunction::Abs.eval(&[ScalarValue::Null]), ScalarValue::Null);
    }

    #[test]
    fn wrong_arity_yields_error() {
        assert_eq!(ScalarFunction::Abs.eval(&[]), ScalarValue::Error);
        assert_eq!(
            ScalarFunction::Length.eval(&[s("a"), s("b")]),
            ScalarValue::Error
        );
    }

    #[test]
    fn wrong_type_yields_error() {
        assert_eq!(ScalarFunction::Upper.eval(&[ScalarValue::Int(1)]), ScalarValue::Error);
        assert_eq!(ScalarFunction::Sqrt.eval(&[s("nope")]), ScalarValue::Error);
    }
}

#[cfg(test)]
mod aggregates {
    use super::*;

    fn values() -> Vec<ScalarValue> {
        vec![
            ScalarValue::Int(10),
            ScalarValue::Null,
            ScalarValue::Int(20),
        ]
    }

    #[test]
    fn count_skips_nulls() {
        assert_eq!(AggregateFunction::Count.apply(&values()), ScalarValue::Int(2));
    }

    #[test]
    fn sum_of_integers_stays_integer() {
        assert_eq!(AggregateFunction::Sum.apply(&values()), ScalarValue::Int(30));
    }

    #[test]
    fn sum_widens_on_float_input() {
        assert_eq!(
            AggregateFunction::Sum.apply(&[ScalarValue::Int(1), ScalarValue::Float(0.5)]),
            ScalarValue::Float(1.5)
        );
    }

    #[test]
    fn avg_is_float() {
        assert_eq!(AggregateFunction::Avg.apply(&values()), ScalarValue::Float(15.0));
    }

    #[test]
    fn min_max_return_original_values() {
        assert_eq!(AggregateFunction::Min.apply(&values()), ScalarValue::Int(10));
        assert_eq!(AggregateFunction::Max.apply(&values()), ScalarValue::Int(20));
    }

    #[test]
    fn empty_input_reduces_to_zero() {
        assert_eq!(AggregateFunction::Sum.apply(&[]), ScalarValue::Int(0));
        assert_eq!(AggregateFunction::Avg.apply(&[]), ScalarValue::Int(0));
        assert_eq!(AggregateFunction::Min.apply(&[]), ScalarValue::Int(0));
        assert_eq!(AggregateFunction::Max.apply(&[]), ScalarValue::Int(0));
        assert_eq!(AggregateFunction::Count.apply(&[]), ScalarValue::Int(0));
    }
}
