#[macro_use]
mod common;

#[cfg(test)]
mod function {
    tests! {
        define_and_call in function is OK
        "Hello, World!"
    }

    tests! {
        display in function is OK
        "<fn f>"
        "<native fn>"
    }

    tests! {
        recursion in function is OK
        "55"
    }

    tests! {
        natives in function is OK
        "true"
    }

    tests! {
        extra_arguments in function is ERR(70)
        "[line 4:18] Error at ')': Expected 2 arguments but got 3"
    }

    tests! {
        missing_arguments in function is ERR(70)
        "[line 4:12] Error at ')': Expected 2 arguments but got 1"
    }

    tests! {
        not_callable in function is ERR(70)
        "[line 1:8] Error at ')': Can only call functions and classes"
    }

    tests! {
        stack_overflow in function is ERR(70)
        "[line 2:11] Error at ')': Stack overflow"
    }
}
