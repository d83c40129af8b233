#[macro_use]
mod common;

#[cfg(test)]
mod operator {
    tests! {
        arithmetic in operator is OK
        "7"
        "9"
        "3"
        "-3"
        "5"
    }

    tests! {
        comparison in operator is OK
        "true"
        "true"
        "false"
        "false"
    }

    tests! {
        equality in operator is OK
        "true"
        "false"
        "true"
        "false"
        "true"
        "false"
        "false"
        "true"
    }

    tests! {
        add_mismatch in operator is ERR(70)
        "[line 1:12] Error at '+': Cannot add a boolean and a number"
    }

    tests! {
        subtract_string in operator is ERR(70)
        "[line 1:11] Error at '-': Operands must be numbers"
    }

    tests! {
        divide_by_zero in operator is ERR(70)
        "[line 1:9] Error at '/': Cannot divide by zero"
    }

    tests! {
        negate_string in operator is ERR(70)
        "[line 1:7] Error at '-': Operand must be a number"
    }

    tests! {
        compare_mixed in operator is ERR(70)
        "[line 1:9] Error at '<': Operands must be numbers"
    }
}
