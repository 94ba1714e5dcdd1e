//! # Integration Test Flows
//!
//! Drives the bridge the way orchestrators and users do: claims, confirms,
//! withdrawals and end-of-block processing, all through [`HyperionApi`].
//!
//! ## Flows Tested
//!
//! 1. **Deposit**: claims gather votes until two thirds of the bridge power
//!    agree, then the voucher is minted to the receiver
//! 2. **Withdrawal**: pool, batch, confirm, execution claim
//! 3. **Valsets**: requested on power change, confirmed, not slashable
//! 4. **Failures**: handler errors after observation are recorded once
//!
//! [`HyperionApi`]: hyperion_bridge::HyperionApi

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use hyperion_bridge::algorithms::{batch_checkpoint, sign_checkpoint, valset_checkpoint};
    use hyperion_bridge::domain::{voucher_denom, TransferStatus};
    use hyperion_bridge::ports::{AttestationStore, BankKeeper, BatchStore, PoolStore};
    use hyperion_bridge::{
        BlockContext, BridgeError, BridgeValidator, Coin, DepositClaim, Erc20DeployedClaim,
        EthAddress, EvidenceSubject, HyperionApi, MsgConfirmBatch, MsgValsetConfirm, Valset,
        WithdrawClaim,
    };
    use primitive_types::U256;

    fn deposit(amount: u64, receiver: String) -> DepositClaim {
        DepositClaim {
            token_contract: contract(0xd0),
            amount: U256::from(amount),
            ethereum_sender: "0x00000000000000000000000000000000000000e1".into(),
            cosmos_receiver: receiver,
            token_metadata: None,
        }
    }

    fn send(h: &Harness, sender: u8, denom: &str, amount: u64, fee: u64) -> u64 {
        h.service
            .send_to_chain(
                BlockContext::new(5),
                user(sender),
                HID,
                contract(0xde),
                Coin::new(denom, amount),
                Coin::new(FEE_DENOM, fee),
            )
            .unwrap()
    }

    // =========================================================================
    // DEPOSITS
    // =========================================================================

    #[test]
    fn test_deposit_observed_at_two_thirds() {
        let h = Harness::new();
        h.add_validator(1, 34);
        h.add_validator(2, 33);
        h.add_validator(3, 33);
        let denom = voucher_denom(HID, &contract(0xd0));

        // 34 of 100 is short of the 67 threshold
        h.service
            .deposit_claim(BlockContext::new(10), h.header(1, 1), deposit(500, user(9).to_string()))
            .unwrap();
        assert_eq!(h.store.last_observed_event_nonce(HID), 0);
        assert_eq!(h.bank.balance(&user(9), &denom), U256::zero());

        h.service
            .deposit_claim(BlockContext::new(10), h.header(2, 1), deposit(500, user(9).to_string()))
            .unwrap();
        assert_eq!(h.store.last_observed_event_nonce(HID), 1);
        assert_eq!(h.bank.balance(&user(9), &denom), U256::from(500));

        // the nonce is settled; a late vote is turned away
        let late = h
            .service
            .deposit_claim(BlockContext::new(11), h.header(3, 1), deposit(500, user(9).to_string()))
            .unwrap_err();
        assert!(matches!(late, BridgeError::Invalid { .. }));
        assert_eq!(h.bank.balance(&user(9), &denom), U256::from(500));
        assert_eq!(h.events.count("attestation_observed"), 1);
    }

    #[test]
    fn test_nonce_gap_rejected() {
        let h = Harness::new();
        h.add_validator(1, 100);
        let err = h
            .service
            .deposit_claim(BlockContext::new(10), h.header(1, 2), deposit(1, user(9).to_string()))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Invalid { .. }));
    }

    #[test]
    fn test_malformed_receiver_funds_community_pool() {
        let h = Harness::new();
        h.add_validator(1, 100);
        h.service
            .deposit_claim(BlockContext::new(10), h.header(1, 1), deposit(42, "not-an-address".into()))
            .unwrap();
        let denom = voucher_denom(HID, &contract(0xd0));
        assert_eq!(h.bank.community_pool(&denom), U256::from(42));
        assert!(h.store.post_observation_errors(HID).is_empty());
    }

    #[test]
    fn test_post_observation_error_recorded_once() {
        let h = Harness::new();
        h.add_validator(1, 34);
        h.add_validator(2, 33);
        h.add_validator(3, 33);
        // no metadata for the denom, so the handler fails after observation
        let claim = Erc20DeployedClaim {
            cosmos_denom: "ahelios".into(),
            token_contract: contract(0x77),
            name: "Helios".into(),
            symbol: "HLS".into(),
            decimals: 18,
        };
        for n in 1..=2 {
            h.service
                .erc20_deployed_claim(BlockContext::new(10), h.header(n, 1), claim.clone())
                .unwrap();
        }
        assert!(h
            .service
            .erc20_deployed_claim(BlockContext::new(11), h.header(3, 1), claim)
            .is_err());

        assert_eq!(h.store.last_observed_event_nonce(HID), 1);
        let errors = h.store.post_observation_errors(HID);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, 5);
    }

    // =========================================================================
    // WITHDRAWALS
    // =========================================================================

    #[test]
    fn test_executing_batch_cancels_earlier_batches() {
        let h = Harness::new();
        h.add_validator(1, 100);
        let denom = h.register_voucher(contract(0xd0));
        for n in [1, 2] {
            h.fund(&user(n), &denom, 100);
            h.fund(&user(n), FEE_DENOM, 10);
        }

        let cheap = send(&h, 1, &denom, 10, 1);
        let first = h
            .service
            .request_batch(BlockContext::new(6), orch_addr(1), HID, &denom)
            .unwrap();
        let rich = send(&h, 2, &denom, 20, 5);
        let second = h
            .service
            .request_batch(BlockContext::new(7), orch_addr(1), HID, &denom)
            .unwrap();
        assert_eq!(first.tx_ids(), vec![cheap]);
        assert_eq!(second.tx_ids(), vec![rich]);
        assert!(h.store.pool_txs(HID).is_empty());

        h.service
            .withdraw_claim(
                BlockContext::new(8),
                h.header(1, 1),
                WithdrawClaim {
                    batch_nonce: second.batch_nonce,
                    token_contract: contract(0xd0),
                },
            )
            .unwrap();

        assert!(h.store.batches(HID).is_empty());
        let pool: Vec<u64> = h.store.pool_txs(HID).iter().map(|t| t.id).collect();
        assert_eq!(pool, vec![cheap]);
        let executed = h.store.executed_batches(HID);
        assert_eq!(executed.len(), 1);
        assert!(executed[0].executed);
        let bridged: Vec<u64> = h
            .store
            .transfers(HID)
            .iter()
            .filter(|t| t.status == TransferStatus::Bridged)
            .map(|t| t.tx_id)
            .collect();
        assert_eq!(bridged, vec![rich]);
    }

    #[test]
    fn test_cancel_send_refunds_amount_and_fee() {
        let h = Harness::new();
        let denom = h.register_voucher(contract(0xd0));
        h.fund(&user(1), &denom, 100);
        h.fund(&user(1), FEE_DENOM, 10);

        let id = send(&h, 1, &denom, 40, 3);
        assert_eq!(h.bank.balance(&user(1), &denom), U256::from(60));
        assert_eq!(h.bank.balance(&user(1), FEE_DENOM), U256::from(7));

        let err = h
            .service
            .cancel_send_to_chain(BlockContext::new(6), user(2), HID, id)
            .unwrap_err();
        assert!(matches!(err, BridgeError::Invalid { .. }));

        h.service
            .cancel_send_to_chain(BlockContext::new(6), user(1), HID, id)
            .unwrap();
        assert_eq!(h.bank.balance(&user(1), &denom), U256::from(100));
        assert_eq!(h.bank.balance(&user(1), FEE_DENOM), U256::from(10));
    }

    #[test]
    fn test_duplicate_batch_confirm_rejected() {
        let h = Harness::new();
        h.add_validator(1, 100);
        let denom = h.register_voucher(contract(0xd0));
        h.fund(&user(1), &denom, 100);
        h.fund(&user(1), FEE_DENOM, 10);
        send(&h, 1, &denom, 10, 1);
        let batch = h
            .service
            .request_batch(BlockContext::new(6), orch_addr(1), HID, &denom)
            .unwrap();

        let signature = sign_checkpoint(&eth_key(1), &batch_checkpoint(&batch, HID))
            .unwrap()
            .to_hex();
        let msg = MsgConfirmBatch {
            hyperion_id: HID,
            nonce: batch.batch_nonce,
            token_contract: batch.token_contract,
            orchestrator: orch_addr(1),
            signature,
        };
        h.service.confirm_batch(BlockContext::new(7), msg.clone()).unwrap();
        let err = h.service.confirm_batch(BlockContext::new(8), msg).unwrap_err();
        assert!(matches!(err, BridgeError::Duplicate { .. }));

        // signed with someone else's key
        let forged = MsgConfirmBatch {
            hyperion_id: HID,
            nonce: batch.batch_nonce,
            token_contract: batch.token_contract,
            orchestrator: orch_addr(1),
            signature: sign_checkpoint(&eth_key(9), &batch_checkpoint(&batch, HID))
                .unwrap()
                .to_hex(),
        };
        assert!(h.service.confirm_batch(BlockContext::new(9), forged).is_err());
    }

    // =========================================================================
    // VALSETS AND EVIDENCE
    // =========================================================================

    #[test]
    fn test_valset_requested_on_power_change_and_confirmed() {
        let h = Harness::new();
        h.add_validator(1, 50);
        h.add_validator(2, 50);

        h.service.end_block(BlockContext::new(1)).unwrap();
        let first = h.service.registry().latest_valset(HID).unwrap();
        assert_eq!(first.nonce, 1);

        let signature = sign_checkpoint(&eth_key(1), &valset_checkpoint(&first, HID))
            .unwrap()
            .to_hex();
        h.service
            .valset_confirm(
                BlockContext::new(2),
                MsgValsetConfirm {
                    hyperion_id: HID,
                    nonce: first.nonce,
                    orchestrator: orch_addr(1),
                    signature,
                },
            )
            .unwrap();
        assert_eq!(h.service.confirmations().valset_confirms(HID, 1).len(), 1);

        h.staking.set_power(&val_addr(1), 70);
        h.staking.set_power(&val_addr(2), 30);
        h.service.end_block(BlockContext::new(3)).unwrap();
        assert_eq!(h.service.registry().latest_valset(HID).unwrap().nonce, 2);
    }

    #[test]
    fn test_evidence_over_real_checkpoint_rejected() {
        let h = Harness::new();
        h.add_validator(1, 1_000_000);
        h.service.end_block(BlockContext::new(1)).unwrap();
        let real = h.service.registry().latest_valset(HID).unwrap();

        let signature = sign_checkpoint(&eth_key(1), &valset_checkpoint(&real, HID))
            .unwrap()
            .to_hex();
        let err = h
            .service
            .submit_bad_signature_evidence(
                BlockContext::new(2),
                HID,
                EvidenceSubject::Valset(real),
                signature,
            )
            .unwrap_err();
        assert!(err.to_string().contains("checkpoint exists"));
        assert!(h.staking.slashes().is_empty());

        let forged = Valset::new(
            HID,
            77,
            1,
            vec![BridgeValidator {
                eth_address: contract(0x66),
                power: u32::MAX as u64,
            }],
            U256::zero(),
            EthAddress::ZERO,
        );
        let signature = sign_checkpoint(&eth_key(1), &valset_checkpoint(&forged, HID))
            .unwrap()
            .to_hex();
        h.service
            .submit_bad_signature_evidence(
                BlockContext::new(3),
                HID,
                EvidenceSubject::Valset(forged),
                signature,
            )
            .unwrap();
        let slashes = h.staking.slashes();
        assert_eq!(slashes.len(), 1);
        assert_eq!(slashes[0].operator, val_addr(1));
    }

    #[test]
    fn test_delegate_keys_set_once() {
        let h = Harness::new();
        h.add_validator(1, 10);
        let err = h
            .service
            .set_orchestrator_addresses(BlockContext::new(2), val_addr(1), orch_addr(5), eth_of(5), HID)
            .unwrap_err();
        assert_eq!(err.code(), 11);
    }
}
